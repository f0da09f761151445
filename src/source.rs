use std::{collections::HashMap, env};

///
/// Where override values come from.
///
/// Absence is a value here, not a failure: `None` means no override is
/// present for `key`. An empty string reads as absent too, so adapters
/// backed by stores that cannot distinguish unset from empty behave
/// the same way.
///
pub trait Source {
    fn get(&self, key: &str) -> Option<String>;
}

///
/// Process environment adapter.
///
#[derive(Clone, Copy, Debug, Default)]
pub struct Env;

impl Source for Env {
    #[inline]
    fn get(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}

/// Deterministic in-memory mapping, mostly useful in tests.
impl Source for HashMap<String, String> {
    #[inline]
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

impl<S: Source + ?Sized> Source for &S {
    #[inline]
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
}
