//! String interning for names and character data.
//!
//! Interned strings live as long as the pool and equal content always maps
//! to the same backing bytes, so repeated names cost one allocation and
//! pointer-wide comparisons elsewhere stay honest. The pool grows
//! monotonically; nothing is freed until the pool itself drops.

use std::cell::RefCell;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::{fmt, slice, str};

use typed_arena::Arena;

/// A string held by a `StringPool`, addressed by raw parts so node storage
/// can carry it without borrowing the pool.
#[derive(Copy, Clone)]
pub(crate) struct InternedString {
    data: *const u8,
    len: usize,
}

impl InternedString {
    pub(crate) fn from_str(s: &str) -> InternedString {
        InternedString {
            data: s.as_ptr(),
            len: s.len(),
        }
    }

    /// Rebuilds the string slice.
    ///
    /// Safety: the pool that stored the bytes must still be alive, and the
    /// caller-chosen lifetime must not outlive it.
    pub(crate) unsafe fn as_str<'s>(&self) -> &'s str {
        let bytes = slice::from_raw_parts(self.data, self.len);
        str::from_utf8_unchecked(bytes)
    }
}

impl PartialEq for InternedString {
    fn eq(&self, other: &InternedString) -> bool {
        unsafe { self.as_str() == other.as_str() }
    }
}

impl Eq for InternedString {}

impl Hash for InternedString {
    fn hash<H: Hasher>(&self, state: &mut H) {
        unsafe { self.as_str() }.hash(state)
    }
}

impl fmt::Debug for InternedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        unsafe { self.as_str() }.fmt(f)
    }
}

pub(crate) struct StringPool {
    storage: Arena<u8>,
    index: RefCell<HashSet<InternedString>>,
}

impl StringPool {
    pub(crate) fn new() -> StringPool {
        StringPool {
            storage: Arena::new(),
            index: RefCell::new(HashSet::new()),
        }
    }

    pub(crate) fn intern<'s>(&'s self, s: &str) -> &'s str {
        if s.is_empty() {
            return "";
        }

        let search_string = InternedString::from_str(s);

        let mut index = self.index.borrow_mut();
        if let Some(interned) = index.get(&search_string) {
            // Entries point into our arena, which outlives this borrow.
            return unsafe { interned.as_str() };
        }

        let stored = self.storage.alloc_str(s);
        let interned = InternedString::from_str(stored);
        // The index must key by the pooled copy; the search string borrows
        // from the caller and may dangle after this call returns.
        index.insert(interned);

        // Arena chunks never move or free before the pool drops, so the
        // bytes are valid for 's.
        unsafe { interned.as_str() }
    }
}

#[cfg(test)]
mod test {
    use super::StringPool;

    #[test]
    fn keeps_the_same_string() {
        let s = StringPool::new();

        let interned = s.intern("hello");

        assert_eq!(interned, "hello");
    }

    #[test]
    fn does_not_reuse_the_pointer_of_the_input() {
        let s = StringPool::new();
        let input = "hello";

        let interned = s.intern(input);

        assert!(input.as_ptr() != interned.as_ptr());
    }

    #[test]
    fn reuses_the_pointer_for_repeated_input() {
        let s = StringPool::new();

        let interned1 = s.intern("world");
        let interned2 = s.intern("world");

        assert_eq!(interned1.as_ptr(), interned2.as_ptr());
    }

    #[test]
    fn ignores_the_lifetime_of_the_input_string() {
        let s = StringPool::new();

        let interned = {
            let allocated_string = String::from("green");
            s.intern(&allocated_string)
        };

        // allocated_string is gone now, but the interned copy stays valid
        // until the pool goes away.

        assert_eq!(interned, "green");
    }

    #[test]
    fn interning_after_the_input_died_finds_the_pooled_copy() {
        let s = StringPool::new();

        let first = {
            let transient = String::from("ephemeral");
            s.intern(&transient).as_ptr()
        };

        let second = s.intern("ephemeral").as_ptr();

        assert_eq!(first, second);
    }

    #[test]
    fn can_be_dropped_immediately() {
        StringPool::new();
    }

    fn return_populated_storage() -> (StringPool, *const u8) {
        let s = StringPool::new();
        let ptr = s.intern("hello").as_ptr();
        (s, ptr)
    }

    #[test]
    fn can_return_storage_populated_with_values() {
        let (s, ptr_val) = return_populated_storage();
        let interned = s.intern("hello");
        assert_eq!(interned.as_ptr(), ptr_val);
    }
}
