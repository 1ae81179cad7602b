use std::hash::Hash;
use std::marker::PhantomData;
use std::num::NonZeroU32;

/// A typed native object name.
///
/// OpenGL hands out plain non-zero integers for every object family. The
/// marker parameter keeps a buffer name from being passed where a texture
/// name is expected.
#[derive(Debug)]
pub struct Handle<T> {
    raw: NonZeroU32,
    phantom: PhantomData<T>,
}

impl<T> Handle<T> {
    pub fn from_raw(raw: NonZeroU32) -> Self {
        Self {
            raw,
            phantom: PhantomData,
        }
    }

    /// Build a handle from a name returned by the driver. Zero is never a
    /// valid object name.
    pub fn new(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self::from_raw)
    }

    pub fn raw(&self) -> NonZeroU32 {
        self.raw
    }

    pub fn get(&self) -> u32 {
        self.raw.get()
    }
}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T> std::fmt::Display for Handle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Slot storage that hands out non-zero names and recycles released ones,
/// the same way a GL implementation reuses object names.
pub struct Pool<T> {
    items: Vec<Option<T>>,
    empty: Vec<usize>,
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Pool<T> {
    pub fn new() -> Self {
        Pool {
            items: Vec::new(),
            empty: Vec::new(),
        }
    }

    pub fn insert(&mut self, item: T) -> NonZeroU32 {
        let slot = match self.empty.pop() {
            Some(slot) => {
                self.items[slot] = Some(item);
                slot
            }
            None => {
                self.items.push(Some(item));
                self.items.len() - 1
            }
        };

        NonZeroU32::new(slot as u32 + 1).unwrap_or(NonZeroU32::MIN)
    }

    pub fn release(&mut self, name: u32) -> Option<T> {
        let slot = Self::slot(name)?;
        let item = self.items.get_mut(slot)?.take()?;
        self.empty.push(slot);
        Some(item)
    }

    pub fn get_ref(&self, name: u32) -> Option<&T> {
        self.items.get(Self::slot(name)?)?.as_ref()
    }

    pub fn get_mut_ref(&mut self, name: u32) -> Option<&mut T> {
        self.items.get_mut(Self::slot(name)?)?.as_mut()
    }

    /// Number of live items.
    pub fn len(&self) -> usize {
        self.items.iter().filter(|item| item.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(name: u32) -> Option<usize> {
        (name as usize).checked_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_never_zero() {
        let mut pool = Pool::new();
        let a = pool.insert("a");
        let b = pool.insert("b");
        assert_eq!(a.get(), 1);
        assert_eq!(b.get(), 2);
        assert_eq!(pool.get_ref(0), None);
    }

    #[test]
    fn released_names_are_reused() {
        let mut pool = Pool::new();
        let a = pool.insert(10);
        let _b = pool.insert(20);
        assert_eq!(pool.release(a.get()), Some(10));
        assert_eq!(pool.release(a.get()), None);
        assert_eq!(pool.len(), 1);

        let c = pool.insert(30);
        assert_eq!(c, a);
        assert_eq!(pool.get_ref(c.get()), Some(&30));
    }

    #[test]
    fn handles_compare_by_name() {
        #[derive(Debug)]
        struct Marker;
        let a = Handle::<Marker>::new(3).unwrap();
        let b = Handle::<Marker>::new(3).unwrap();
        assert_eq!(a, b);
        assert!(Handle::<Marker>::new(0).is_none());
    }
}
