/// One step taken while descending into the input document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/**
The ordered sequence of keys and list indices leading from the document
root to a node. Every [`ConfigNode`](super::ConfigNode) carries its own
breadcrumb so that errors can point at the exact field that caused them.

Renders as `configurations[0].steppers[1].Name`; the root renders as
`<root>`.
 */
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Breadcrumb {
    segments: Vec<PathSegment>,
}

impl Breadcrumb {
    pub fn new() -> Breadcrumb {
        Breadcrumb { segments: vec![] }
    }

    /// Returns a new breadcrumb which extends this one by an object key.
    pub fn key(&self, key: &str) -> Breadcrumb {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Key(key.into()));
        Breadcrumb { segments }
    }

    /// Returns a new breadcrumb which extends this one by a list index.
    pub fn index(&self, idx: usize) -> Breadcrumb {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Index(idx));
        Breadcrumb { segments }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl std::fmt::Display for Breadcrumb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("<root>");
        }

        for (idx, seg) in self.segments.iter().enumerate() {
            match seg {
                PathSegment::Key(key) if idx == 0 => f.write_str(key)?,
                PathSegment::Key(key) => write!(f, ".{}", key)?,
                PathSegment::Index(i) => write!(f, "[{}]", i)?,
            }
        }
        Ok(())
    }
}
