//! Reallocatable render target addressed through generation-checked handles.
//!
//! The slot owns at most one resource. Callers never keep a borrow across
//! frames; they keep a [`TargetHandle`] and resolve it again, which fails once
//! the slot has been reallocated.

use crate::surface::SurfaceSize;

/// Identifies one allocation of a slot's resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetHandle {
    pub generation: u64,
    pub width: u32,
    pub height: u32,
}

impl TargetHandle {
    pub fn size(&self) -> SurfaceSize {
        SurfaceSize::new(self.width, self.height)
    }
}

/// A resource that must be explicitly released before being dropped.
pub(crate) trait Releasable {
    fn release(&mut self);
}

struct Allocation<T> {
    handle: TargetHandle,
    resource: T,
}

pub(crate) struct TargetSlot<T: Releasable> {
    current: Option<Allocation<T>>,
    generation: u64,
}

impl<T: Releasable> TargetSlot<T> {
    pub fn new() -> Self {
        Self {
            current: None,
            generation: 0,
        }
    }

    /// Returns the current handle if it already matches `size`, otherwise
    /// releases the stale resource and allocates a new one.
    pub fn ensure(
        &mut self,
        size: SurfaceSize,
        allocate: impl FnOnce(SurfaceSize) -> T,
    ) -> TargetHandle {
        if let Some(current) = &self.current {
            if current.handle.size() == size {
                return current.handle;
            }
        }

        if let Some(mut stale) = self.current.take() {
            stale.resource.release();
        }

        self.generation += 1;
        let handle = TargetHandle {
            generation: self.generation,
            width: size.width,
            height: size.height,
        };
        self.current = Some(Allocation {
            handle,
            resource: allocate(size),
        });
        handle
    }

    pub fn get(&self, handle: TargetHandle) -> Option<&T> {
        self.current
            .as_ref()
            .filter(|current| current.handle == handle)
            .map(|current| &current.resource)
    }

    pub fn current(&self) -> Option<(TargetHandle, &T)> {
        self.current
            .as_ref()
            .map(|current| (current.handle, &current.resource))
    }
}

impl<T: Releasable> Drop for TargetSlot<T> {
    fn drop(&mut self) {
        if let Some(mut current) = self.current.take() {
            current.resource.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Tracked {
        size: SurfaceSize,
        released: Rc<Cell<u32>>,
    }

    impl Releasable for Tracked {
        fn release(&mut self) {
            self.released.set(self.released.get() + 1);
        }
    }

    fn allocator(
        allocations: &Rc<Cell<u32>>,
        released: &Rc<Cell<u32>>,
    ) -> impl FnOnce(SurfaceSize) -> Tracked {
        let allocations = allocations.clone();
        let released = released.clone();
        move |size| {
            allocations.set(allocations.get() + 1);
            Tracked { size, released }
        }
    }

    #[test]
    fn unchanged_size_reuses_allocation() {
        let allocations = Rc::new(Cell::new(0));
        let released = Rc::new(Cell::new(0));
        let mut slot = TargetSlot::new();
        let size = SurfaceSize::new(800, 600);

        let first = slot.ensure(size, allocator(&allocations, &released));
        let second = slot.ensure(size, allocator(&allocations, &released));

        assert_eq!(first, second);
        assert_eq!(allocations.get(), 1);
        assert_eq!(released.get(), 0);
        assert!(slot.get(first).is_some());
    }

    #[test]
    fn size_change_reallocates_and_releases_previous() {
        let allocations = Rc::new(Cell::new(0));
        let released = Rc::new(Cell::new(0));
        let mut slot = TargetSlot::new();

        let old = slot.ensure(SurfaceSize::new(800, 600), allocator(&allocations, &released));
        let new = slot.ensure(SurfaceSize::new(1024, 600), allocator(&allocations, &released));

        assert_ne!(old, new);
        assert!(new.generation > old.generation);
        assert_eq!(new.size(), SurfaceSize::new(1024, 600));
        assert_eq!(allocations.get(), 2);
        assert_eq!(released.get(), 1);
        assert!(slot.get(old).is_none());
        let resource = slot.get(new).expect("current allocation resolves");
        assert_eq!(resource.size, SurfaceSize::new(1024, 600));
    }

    #[test]
    fn height_only_change_is_detected() {
        let allocations = Rc::new(Cell::new(0));
        let released = Rc::new(Cell::new(0));
        let mut slot = TargetSlot::new();
        slot.ensure(SurfaceSize::new(640, 480), allocator(&allocations, &released));
        slot.ensure(SurfaceSize::new(640, 481), allocator(&allocations, &released));
        assert_eq!(allocations.get(), 2);
    }

    #[test]
    fn drop_releases_current_allocation() {
        let allocations = Rc::new(Cell::new(0));
        let released = Rc::new(Cell::new(0));
        {
            let mut slot = TargetSlot::new();
            slot.ensure(SurfaceSize::new(32, 32), allocator(&allocations, &released));
        }
        assert_eq!(released.get(), 1);
    }
}
