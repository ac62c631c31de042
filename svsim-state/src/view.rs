//! Shared mutable view over an amplitude buffer for parallel kernels

use num_complex::Complex64;
use std::marker::PhantomData;
use std::ptr::NonNull;

/// Raw view handed to traversal closures
///
/// Index blocks produced for distinct reduced indices never share a full
/// index, so concurrent closures that only touch their own block never alias.
/// All accessors are `unsafe` because that disjointness is the caller's to uphold.
#[derive(Clone, Copy)]
pub struct AmplitudeView<'a> {
    ptr: NonNull<Complex64>,
    len: usize,
    _marker: PhantomData<&'a mut [Complex64]>,
}

// SAFETY: access is restricted to disjoint indices per worker (see type docs).
unsafe impl Send for AmplitudeView<'_> {}
unsafe impl Sync for AmplitudeView<'_> {}

impl<'a> AmplitudeView<'a> {
    pub fn new(data: &'a mut [Complex64]) -> Self {
        Self {
            len: data.len(),
            ptr: NonNull::from(data).cast(),
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// # Safety
    /// `index < len` and no other thread writes `index` concurrently.
    #[inline]
    pub unsafe fn get(&self, index: u64) -> Complex64 {
        debug_assert!((index as usize) < self.len);
        *self.ptr.as_ptr().add(index as usize)
    }

    /// # Safety
    /// `index < len` and no other thread accesses `index` concurrently.
    #[inline]
    pub unsafe fn set(&self, index: u64, value: Complex64) {
        debug_assert!((index as usize) < self.len);
        *self.ptr.as_ptr().add(index as usize) = value;
    }

    /// # Safety
    /// Both indices are in bounds and owned by the calling worker.
    #[inline]
    pub unsafe fn swap(&self, a: u64, b: u64) {
        debug_assert!((a as usize) < self.len && (b as usize) < self.len);
        std::ptr::swap(
            self.ptr.as_ptr().add(a as usize),
            self.ptr.as_ptr().add(b as usize),
        );
    }

    /// # Safety
    /// `index < len` and no other thread accesses `index` concurrently.
    #[inline]
    pub unsafe fn scale(&self, index: u64, factor: Complex64) {
        let p = self.ptr.as_ptr().add(index as usize);
        *p *= factor;
    }
}
