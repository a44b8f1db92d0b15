//! Per-field provider chains: explicit > interactive > detected > default.

use std::fmt;

/// Which provider supplied a configuration value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Provenance {
    /// Command line parameter
    Explicit,
    /// Wizard answer
    Interactive,
    /// Derived from the game tree or another field
    Detected,
    /// Documented default or persisted setting
    Default,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Provenance::Explicit => "command line",
            Provenance::Interactive => "wizard",
            Provenance::Detected => "detected",
            Provenance::Default => "default",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<T> {
    pub value: T,
    pub provenance: Provenance,
}

type Provider<'a, T> = Box<dyn FnOnce() -> Option<T> + 'a>;

/// Ordered providers for one field. Later providers are only evaluated
/// when every earlier one came up empty, so detection that walks the game
/// tree costs nothing when the user was explicit.
pub struct Chain<'a, T> {
    providers: Vec<(Provenance, Provider<'a, T>)>,
}

impl<'a, T: 'a> Chain<'a, T> {
    pub fn new() -> Self {
        Self {
            providers: Vec::with_capacity(4),
        }
    }

    pub fn explicit(self, value: Option<T>) -> Self {
        self.with(Provenance::Explicit, move || value)
    }

    pub fn interactive(self, value: Option<T>) -> Self {
        self.with(Provenance::Interactive, move || value)
    }

    pub fn detected(self, detect: impl FnOnce() -> Option<T> + 'a) -> Self {
        self.with(Provenance::Detected, detect)
    }

    fn with(mut self, provenance: Provenance, provider: impl FnOnce() -> Option<T> + 'a) -> Self {
        self.providers.push((provenance, Box::new(provider)));
        self
    }

    /// First non-empty provider, or `None` when the field stays unset.
    pub fn resolve(self) -> Option<Resolved<T>> {
        self.providers
            .into_iter()
            .find_map(|(provenance, provider)| provider().map(|value| Resolved { value, provenance }))
    }

    /// Resolve with `fallback` as the last provider.
    pub fn resolve_or(self, fallback: T) -> Resolved<T> {
        self.resolve().unwrap_or(Resolved {
            value: fallback,
            provenance: Provenance::Default,
        })
    }
}

impl<'a, T: 'a> Default for Chain<'a, T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn explicit_beats_everything() {
        let resolved = Chain::new()
            .explicit(Some(1))
            .interactive(Some(2))
            .detected(|| Some(3))
            .resolve_or(4);
        assert_eq!(resolved, Resolved { value: 1, provenance: Provenance::Explicit });
    }

    #[test]
    fn falls_through_empty_providers() {
        let resolved = Chain::new()
            .explicit(None)
            .interactive(None)
            .detected(|| None)
            .resolve_or("fallback");
        assert_eq!(resolved.value, "fallback");
        assert_eq!(resolved.provenance, Provenance::Default);
    }

    #[test]
    fn detection_is_lazy() {
        let calls = Cell::new(0);
        let resolved = Chain::new()
            .interactive(Some("wizard"))
            .detected(|| {
                calls.set(calls.get() + 1);
                Some("scan")
            })
            .resolve()
            .unwrap();
        assert_eq!(resolved.provenance, Provenance::Interactive);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn resolve_or_marks_fallback_as_default() {
        let resolved = Chain::new().explicit(None).resolve_or(7);
        assert_eq!(resolved, Resolved { value: 7, provenance: Provenance::Default });
    }

    #[test]
    fn unset_mandatory_field_is_none() {
        let resolved: Option<Resolved<String>> =
            Chain::new().explicit(None).detected(|| None).resolve();
        assert!(resolved.is_none());
    }
}
