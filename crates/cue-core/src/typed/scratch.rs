//! Scratch pads - (task, invocation) ごとの一時状態
//!
//! # 二層構造
//! - **表層（Typed）**: `TypedScratchPad`（`const KIND` で種類を静的に決める）
//! - **内部（Dyn）**: `dyn ScratchPad`（Invocation のスロットに格納、downcast で取り出す）
//!
//! `ScratchPadPool` は種類ごとの再利用プール。起動時に明示的に
//! `register` し、未登録の種類は acquire できません。

use std::any::Any;
use std::collections::HashMap;

use parking_lot::Mutex;

use super::registry::RegistryError;

/// Object-safe scratch pad.
pub trait ScratchPad: Any + Send {
    fn kind(&self) -> &'static str;

    /// Return to the freshly constructed state.
    fn reset(&mut self);

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A scratch pad type known at compile time.
pub trait TypedScratchPad: ScratchPad + Default {
    const KIND: &'static str;
}

impl dyn ScratchPad {
    pub fn downcast_ref<P: TypedScratchPad>(&self) -> Option<&P> {
        self.as_any().downcast_ref::<P>()
    }

    pub fn downcast_mut<P: TypedScratchPad>(&mut self) -> Option<&mut P> {
        self.as_any_mut().downcast_mut::<P>()
    }
}

fn construct<P: TypedScratchPad>() -> Box<dyn ScratchPad> {
    Box::new(P::default())
}

/// Pool of released pads, keyed by kind.
pub struct ScratchPadPool {
    capacity_per_kind: usize,
    factories: HashMap<&'static str, fn() -> Box<dyn ScratchPad>>,
    free: Mutex<HashMap<&'static str, Vec<Box<dyn ScratchPad>>>>,
}

impl ScratchPadPool {
    pub const DEFAULT_CAPACITY_PER_KIND: usize = 32;

    pub fn new(capacity_per_kind: usize) -> Self {
        Self {
            capacity_per_kind,
            factories: HashMap::new(),
            free: Mutex::new(HashMap::new()),
        }
    }

    pub fn register<P: TypedScratchPad>(&mut self) -> Result<(), RegistryError> {
        if self.factories.contains_key(P::KIND) {
            return Err(RegistryError::AlreadyRegistered(P::KIND.to_string()));
        }
        self.factories.insert(P::KIND, construct::<P> as fn() -> Box<dyn ScratchPad>);
        Ok(())
    }

    pub fn is_registered(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    pub fn registered_kinds(&self) -> Vec<&'static str> {
        let mut kinds: Vec<&'static str> = self.factories.keys().copied().collect();
        kinds.sort_unstable();
        kinds
    }

    /// A reset pad of type `P`, reused from the pool when possible.
    pub fn acquire<P: TypedScratchPad>(&self) -> Result<Box<dyn ScratchPad>, RegistryError> {
        let Some(factory) = self.factories.get(P::KIND) else {
            return Err(RegistryError::NotRegistered(P::KIND.to_string()));
        };
        let pooled = self.free.lock().get_mut(P::KIND).and_then(Vec::pop);
        Ok(pooled.unwrap_or_else(factory))
    }

    /// Reset `pad` and keep it for reuse. Pads of unknown kinds are dropped.
    pub fn release(&self, mut pad: Box<dyn ScratchPad>) {
        let kind = pad.kind();
        let Some((&kind, _)) = self.factories.get_key_value(kind) else {
            return;
        };
        pad.reset();
        let mut free = self.free.lock();
        let slot = free.entry(kind).or_default();
        if slot.len() < self.capacity_per_kind {
            slot.push(pad);
        }
    }

    pub fn pooled(&self, kind: &str) -> usize {
        self.free.lock().get(kind).map(Vec::len).unwrap_or(0)
    }
}

impl Default for ScratchPadPool {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY_PER_KIND)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct CounterPad {
        count: u32,
    }

    impl ScratchPad for CounterPad {
        fn kind(&self) -> &'static str {
            Self::KIND
        }

        fn reset(&mut self) {
            self.count = 0;
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    impl TypedScratchPad for CounterPad {
        const KIND: &'static str = "test.counter";
    }

    #[test]
    fn acquire_requires_registration() {
        let pool = ScratchPadPool::default();
        let err = pool.acquire::<CounterPad>().err().unwrap();
        assert_eq!(err, RegistryError::NotRegistered("test.counter".into()));
    }

    #[test]
    fn double_registration_is_rejected() {
        let mut pool = ScratchPadPool::default();
        pool.register::<CounterPad>().unwrap();
        assert!(matches!(
            pool.register::<CounterPad>(),
            Err(RegistryError::AlreadyRegistered(_))
        ));
    }

    #[test]
    fn released_pads_are_reset_and_reused() {
        let mut pool = ScratchPadPool::default();
        pool.register::<CounterPad>().unwrap();

        let mut pad = pool.acquire::<CounterPad>().unwrap();
        pad.downcast_mut::<CounterPad>().unwrap().count = 7;
        pool.release(pad);
        assert_eq!(pool.pooled(CounterPad::KIND), 1);

        let pad = pool.acquire::<CounterPad>().unwrap();
        assert_eq!(pad.downcast_ref::<CounterPad>().unwrap().count, 0);
        assert_eq!(pool.pooled(CounterPad::KIND), 0);
    }

    #[test]
    fn pool_respects_capacity() {
        let mut pool = ScratchPadPool::new(1);
        pool.register::<CounterPad>().unwrap();
        let a = pool.acquire::<CounterPad>().unwrap();
        let b = pool.acquire::<CounterPad>().unwrap();
        pool.release(a);
        pool.release(b);
        assert_eq!(pool.pooled(CounterPad::KIND), 1);
    }
}
