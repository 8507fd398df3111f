//! Switch between rayon and plain iterators for voxel kernels.
//!
//! With the `parallel` feature the kernels fan out over rayon's global
//! pool. Without it (single-threaded targets) `into_par_iter()` resolves
//! to `into_iter()` and the rest of the chain to `Iterator` methods, so
//! kernel code is written once.

#[cfg(feature = "parallel")]
pub use rayon::prelude::*;

/// Number of worker threads voxel kernels may use
#[cfg(feature = "parallel")]
pub fn worker_count() -> usize {
    rayon::current_num_threads()
}

#[cfg(not(feature = "parallel"))]
mod sequential {
    /// Sequential stand-in for `rayon::prelude::IntoParallelIterator`.
    pub trait IntoParallelIterator {
        type Iter;
        type Item;
        fn into_par_iter(self) -> Self::Iter;
    }

    impl<I: IntoIterator> IntoParallelIterator for I {
        type Iter = I::IntoIter;
        type Item = I::Item;
        fn into_par_iter(self) -> Self::Iter {
            self.into_iter()
        }
    }

    /// Number of worker threads voxel kernels may use
    pub fn worker_count() -> usize {
        1
    }
}

#[cfg(not(feature = "parallel"))]
pub use sequential::*;
