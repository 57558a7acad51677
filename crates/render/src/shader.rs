use std::collections::HashMap;

use tracing::trace;

use crate::uniform::Uniform;

/// Resolves named shader inputs to locations. `None` means the program has
/// no active input of that name.
pub trait ShaderLike {
    fn attrib_location(&mut self, name: &str) -> Option<u32>;
    fn uniform_location(&mut self, name: &str) -> Option<u32>;

    /// Uniform handle for `name`, or `None` when the program lacks it.
    fn uniform(&mut self, name: &str) -> Option<Uniform> {
        self.uniform_location(name).map(Uniform::new)
    }
}

/// Raw location lookup against a linked program, answering `-1` for
/// inputs the program does not expose.
pub trait LocationQuery {
    fn query_attrib(&mut self, name: &str) -> i32;
    fn query_uniform(&mut self, name: &str) -> i32;
}

/// Memoizing [`ShaderLike`] over a [`LocationQuery`].
///
/// A found location is queried once per name; misses are re-queried on
/// every call.
#[derive(Debug, Default)]
pub struct CachedShader<Q> {
    query: Q,
    attribs: HashMap<String, u32>,
    uniforms: HashMap<String, u32>,
}

fn resolve(
    cache: &mut HashMap<String, u32>,
    name: &str,
    query: impl FnOnce(&str) -> i32,
) -> Option<u32> {
    if let Some(&loc) = cache.get(name) {
        return Some(loc);
    }
    match u32::try_from(query(name)) {
        Ok(loc) => {
            cache.insert(name.to_owned(), loc);
            Some(loc)
        }
        Err(_) => {
            trace!(name, "shader input not found");
            None
        }
    }
}

impl<Q: LocationQuery> CachedShader<Q> {
    pub fn new(query: Q) -> Self {
        Self {
            query,
            attribs: HashMap::new(),
            uniforms: HashMap::new(),
        }
    }

    pub fn inner(&self) -> &Q {
        &self.query
    }

    pub fn into_inner(self) -> Q {
        self.query
    }
}

impl<Q: LocationQuery> ShaderLike for CachedShader<Q> {
    fn attrib_location(&mut self, name: &str) -> Option<u32> {
        let query = &mut self.query;
        resolve(&mut self.attribs, name, |n| query.query_attrib(n))
    }

    fn uniform_location(&mut self, name: &str) -> Option<u32> {
        let query = &mut self.query;
        resolve(&mut self.uniforms, name, |n| query.query_uniform(n))
    }
}

/// Table-driven [`LocationQuery`] that counts how often it is asked.
#[derive(Debug, Clone, Default)]
pub struct FixedLocations {
    attribs: HashMap<String, i32>,
    uniforms: HashMap<String, i32>,
    queries: usize,
}

impl FixedLocations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attrib(mut self, name: &str, location: i32) -> Self {
        self.attribs.insert(name.to_owned(), location);
        self
    }

    pub fn with_uniform(mut self, name: &str, location: i32) -> Self {
        self.uniforms.insert(name.to_owned(), location);
        self
    }

    /// Attributes numbered in the given order starting at 0.
    pub fn sequential<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        names
            .into_iter()
            .enumerate()
            .fold(Self::new(), |acc, (i, name)| acc.with_attrib(name, i as i32))
    }

    pub fn query_count(&self) -> usize {
        self.queries
    }
}

impl LocationQuery for FixedLocations {
    fn query_attrib(&mut self, name: &str) -> i32 {
        self.queries += 1;
        self.attribs.get(name).copied().unwrap_or(-1)
    }

    fn query_uniform(&mut self, name: &str) -> i32 {
        self.queries += 1;
        self.uniforms.get(name).copied().unwrap_or(-1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hits_are_cached() {
        let mut shader = CachedShader::new(FixedLocations::new().with_attrib("a_position", 2));
        assert_eq!(shader.attrib_location("a_position"), Some(2));
        assert_eq!(shader.attrib_location("a_position"), Some(2));
        assert_eq!(shader.inner().query_count(), 1);
    }

    #[test]
    fn misses_are_requeried() {
        let mut shader = CachedShader::new(FixedLocations::new());
        assert_eq!(shader.attrib_location("a_color"), None);
        assert_eq!(shader.attrib_location("a_color"), None);
        assert_eq!(shader.inner().query_count(), 2);
    }

    #[test]
    fn attrib_and_uniform_namespaces_are_separate() {
        let mut shader = CachedShader::new(
            FixedLocations::new()
                .with_attrib("x", 1)
                .with_uniform("x", 7),
        );
        assert_eq!(shader.attrib_location("x"), Some(1));
        assert_eq!(shader.uniform_location("x"), Some(7));
        assert_eq!(shader.uniform_location("u_missing"), None);
    }

    #[test]
    fn uniform_handle_wraps_location() {
        let mut shader = CachedShader::new(FixedLocations::new().with_uniform("u_time", 5));
        assert_eq!(shader.uniform("u_time").map(|u| u.location()), Some(5));
        assert_eq!(shader.uniform("u_missing"), None);
    }

    #[test]
    fn negative_locations_are_misses() {
        let mut shader = CachedShader::new(FixedLocations::new().with_uniform("u_mvp", -1));
        assert_eq!(shader.uniform_location("u_mvp"), None);
    }

    #[test]
    fn sequential_numbers_in_order() {
        let mut q = FixedLocations::sequential(["a", "b", "c"]);
        assert_eq!(q.query_attrib("c"), 2);
        assert_eq!(q.query_attrib("d"), -1);
        assert_eq!(q.query_count(), 2);
    }
}
