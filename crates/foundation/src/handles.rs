/// Generational handle: `(index, generation)`.
///
/// A slot index may be reused after release; the generation tells a stale
/// handle apart from the handle currently occupying the slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(self) -> u32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

/// Hands out handles and tracks which generation is live in each slot.
#[derive(Debug, Default)]
pub struct HandleAllocator {
    generations: Vec<u32>,
    live: Vec<bool>,
    free: Vec<u32>,
}

impl HandleAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> Handle {
        if let Some(index) = self.free.pop() {
            let slot = index as usize;
            self.live[slot] = true;
            return Handle::new(index, self.generations[slot]);
        }

        let index = self.generations.len() as u32;
        self.generations.push(0);
        self.live.push(true);
        Handle::new(index, 0)
    }

    /// Release a handle. Returns `false` if it was already stale.
    pub fn release(&mut self, handle: Handle) -> bool {
        if !self.is_live(handle) {
            return false;
        }
        let slot = handle.index as usize;
        self.live[slot] = false;
        self.generations[slot] = self.generations[slot].wrapping_add(1);
        self.free.push(handle.index);
        true
    }

    pub fn is_live(&self, handle: Handle) -> bool {
        let slot = handle.index as usize;
        self.live.get(slot).copied().unwrap_or(false)
            && self.generations[slot] == handle.generation
    }

    pub fn live_count(&self) -> usize {
        self.live.iter().filter(|l| **l).count()
    }

    /// Release every live handle at once.
    pub fn release_all(&mut self) {
        for slot in 0..self.live.len() {
            if self.live[slot] {
                self.live[slot] = false;
                self.generations[slot] = self.generations[slot].wrapping_add(1);
                self.free.push(slot as u32);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::HandleAllocator;

    #[test]
    fn released_handle_becomes_stale() {
        let mut alloc = HandleAllocator::new();
        let a = alloc.allocate();
        assert!(alloc.is_live(a));
        assert!(alloc.release(a));
        assert!(!alloc.is_live(a));
        assert!(!alloc.release(a));
    }

    #[test]
    fn reused_slot_gets_new_generation() {
        let mut alloc = HandleAllocator::new();
        let a = alloc.allocate();
        alloc.release(a);
        let b = alloc.allocate();
        assert_eq!(a.index(), b.index());
        assert_ne!(a.generation(), b.generation());
        assert!(!alloc.is_live(a));
        assert!(alloc.is_live(b));
    }

    #[test]
    fn release_all_invalidates_everything() {
        let mut alloc = HandleAllocator::new();
        let a = alloc.allocate();
        let b = alloc.allocate();
        alloc.release_all();
        assert_eq!(alloc.live_count(), 0);
        assert!(!alloc.is_live(a));
        assert!(!alloc.is_live(b));
    }
}
