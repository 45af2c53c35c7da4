use std::collections::BTreeMap;
use std::fmt;

use tracing::warn;

use crate::compile::CompiledProgram;
use crate::uniform::{UniformSet, UniformValue};

/// Identifier handed out by a [`crate::ProgramCompiler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(pub u32);

/// The four texture programs the renderer keeps live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramKind {
    /// Legacy external-texture program (`samplerExternalOES`).
    Ext,
    Rgba,
    /// RGB textures whose alpha channel must be ignored.
    Rgbx,
    /// Color-managed program.
    Cm,
}

impl ProgramKind {
    pub const ALL: [ProgramKind; 4] = [Self::Ext, Self::Rgba, Self::Rgbx, Self::Cm];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ext => "ext",
            Self::Rgba => "rgba",
            Self::Rgbx => "rgbx",
            Self::Cm => "cm",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ext" => Some(Self::Ext),
            "rgba" => Some(Self::Rgba),
            "rgbx" => Some(Self::Rgbx),
            "cm" => Some(Self::Cm),
            _ => None,
        }
    }
}

impl fmt::Display for ProgramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A uniform bound on a program: where it lives and what it is set to.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundUniform {
    /// `None` when the program has no active uniform of that name; the value is
    /// kept but never uploaded.
    pub location: Option<i32>,
    pub value: UniformValue,
}

/// A compiled program plus its primed uniform bindings.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    id: ProgramId,
    kind: ProgramKind,
    active: BTreeMap<String, i32>,
    bound: BTreeMap<String, BoundUniform>,
}

impl Program {
    pub fn new(kind: ProgramKind, compiled: CompiledProgram) -> Self {
        Self {
            id: compiled.id,
            kind,
            active: compiled.uniforms.into_iter().collect(),
            bound: BTreeMap::new(),
        }
    }

    /// A program without uniforms, e.g. the renderer's stock programs.
    pub fn placeholder(id: ProgramId, kind: ProgramKind) -> Self {
        Self {
            id,
            kind,
            active: BTreeMap::new(),
            bound: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> ProgramId {
        self.id
    }

    pub fn kind(&self) -> ProgramKind {
        self.kind
    }

    pub fn location(&self, name: &str) -> Option<i32> {
        self.active.get(name).copied()
    }

    pub fn bound(&self, name: &str) -> Option<&BoundUniform> {
        self.bound.get(name)
    }

    /// Binds every value in `args` to its location. Returns whether any binding
    /// changed; priming twice with the same values is a no-op.
    pub fn prime(&mut self, args: &UniformSet) -> bool {
        let mut changed = false;
        for (name, value) in args {
            if let Some(existing) = self.bound.get_mut(name.as_str()) {
                if existing.value != *value {
                    existing.value = *value;
                    changed = true;
                }
                continue;
            }

            let location = self.active.get(name.as_str()).copied();
            if location.is_none() {
                warn!(
                    program = self.id.0,
                    kind = %self.kind,
                    uniform = %name,
                    "uniform is not active in program"
                );
            }
            self.bound.insert(
                name.clone(),
                BoundUniform {
                    location,
                    value: *value,
                },
            );
            changed = true;
        }
        changed
    }
}

/// Access to a set of the four program slots.
///
/// The renderer implements this over its live programs so a shaded set can be
/// exchanged in before a window is drawn.
pub trait ProgramSlots {
    fn slot_mut(&mut self, kind: ProgramKind) -> &mut Program;
}

/// One program per [`ProgramKind`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramSet {
    pub ext: Program,
    pub rgba: Program,
    pub rgbx: Program,
    pub cm: Program,
}

impl ProgramSet {
    /// Builds a set by calling `make` once per kind, in [`ProgramKind::ALL`] order.
    pub fn try_from_fn<E>(mut make: impl FnMut(ProgramKind) -> Result<Program, E>) -> Result<Self, E> {
        Ok(Self {
            ext: make(ProgramKind::Ext)?,
            rgba: make(ProgramKind::Rgba)?,
            rgbx: make(ProgramKind::Rgbx)?,
            cm: make(ProgramKind::Cm)?,
        })
    }

    pub fn get(&self, kind: ProgramKind) -> &Program {
        match kind {
            ProgramKind::Ext => &self.ext,
            ProgramKind::Rgba => &self.rgba,
            ProgramKind::Rgbx => &self.rgbx,
            ProgramKind::Cm => &self.cm,
        }
    }

    /// Primes all four programs; true when any of them changed.
    pub fn prime(&mut self, args: &UniformSet) -> bool {
        ProgramKind::ALL
            .iter()
            .fold(false, |changed, kind| self.slot_mut(*kind).prime(args) | changed)
    }

    pub fn ids(&self) -> [ProgramId; 4] {
        ProgramKind::ALL.map(|kind| self.get(kind).id())
    }
}

impl ProgramSlots for ProgramSet {
    fn slot_mut(&mut self, kind: ProgramKind) -> &mut Program {
        match kind {
            ProgramKind::Ext => &mut self.ext,
            ProgramKind::Rgba => &mut self.rgba,
            ProgramKind::Rgbx => &mut self.rgbx,
            ProgramKind::Cm => &mut self.cm,
        }
    }
}

/// Swaps every slot of `a` with the matching slot of `b`. Applying it twice
/// leaves both sides as they started.
pub fn exchange(a: &mut dyn ProgramSlots, b: &mut dyn ProgramSlots) {
    for kind in ProgramKind::ALL {
        std::mem::swap(a.slot_mut(kind), b.slot_mut(kind));
    }
}
