//! Arena allocator for AST nodes.
//!
//! One arena backs one compilation. Every node the parser builds lives in it
//! and the whole tree is freed at once when the arena is dropped.

use bumpalo::Bump;

/// Arena allocator for AST nodes.
pub struct Arena {
    bump: Bump,
}

impl Arena {
    pub fn new() -> Self {
        Self { bump: Bump::new() }
    }

    /// Pre-size the arena. Scripts allocate roughly a few nodes per token,
    /// so a capacity proportional to the source length avoids regrowth.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bump: Bump::with_capacity(capacity),
        }
    }

    /// Allocate a value in the arena.
    #[inline]
    pub fn alloc<T>(&self, val: T) -> &T {
        self.bump.alloc(val)
    }

    /// Create a Vec that allocates in this arena.
    #[inline]
    pub fn vec<T>(&self) -> Vec<'_, T> {
        Vec::new_in(&self.bump)
    }

    /// Get the total bytes allocated.
    pub fn allocated_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

/// A vec allocated in an arena.
pub type Vec<'a, T> = bumpalo::collections::Vec<'a, T>;
