//! Keeps every compiled window shader by id and creates new ones on demand.
//!
//! Shaders come from three places: the builtin catalog, explicit definitions
//! (from configuration or a caller), and parameterized specifiers such as
//! `"tint tintStrength=0.4"` which derive a new shader the first time they are
//! seen. Definitions are idempotent by id, so a specifier that repeats is a
//! cache hit rather than a recompilation.
//!
//! Types:
//!
//! - `ShaderDefinition` describes a shader to create: an optional base to
//!   derive from, optional GLSL (file or inline), uniform overrides, and the
//!   transparency flag.
//! - `ShaderRegistry` owns the compile service and the id → variant table.
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use glprog::{compile_program_set, ProgramCompiler, UniformSet, UniformValue};
use shadeconf::{ArgValue, ConfigError, ShadeConfig};
use tracing::{debug, info, warn};

use crate::builtin::{self, Builtin, BUILTINS};
use crate::error::{Result, ShadeError};
use crate::specifier::Specifier;
use crate::variant::{ShaderVariant, SharedPrograms};

/// Where fresh GLSL for a definition comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ShaderSource {
    Path(PathBuf),
    Glsl(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShaderDefinition {
    pub id: String,
    pub from: Option<String>,
    pub source: Option<ShaderSource>,
    pub args: UniformSet,
    pub transparency: bool,
}

impl ShaderDefinition {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            from: None,
            source: None,
            args: UniformSet::new(),
            transparency: false,
        }
    }

    /// A shader that reuses `from`'s programs with some uniforms overridden.
    pub fn derived(id: impl Into<String>, from: impl Into<String>, args: UniformSet) -> Self {
        Self {
            from: Some(from.into()),
            args,
            ..Self::new(id)
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(ShaderSource::Path(path.into()));
        self
    }

    pub fn with_glsl(mut self, glsl: impl Into<String>) -> Self {
        self.source = Some(ShaderSource::Glsl(glsl.into()));
        self
    }

    pub fn with_args(mut self, args: UniformSet) -> Self {
        self.args = args;
        self
    }

    pub fn transparent(mut self, transparency: bool) -> Self {
        self.transparency = transparency;
        self
    }
}

pub struct ShaderRegistry {
    compiler: Box<dyn ProgramCompiler>,
    shaders: HashMap<String, Rc<ShaderVariant>>,
}

impl ShaderRegistry {
    pub fn new(compiler: impl ProgramCompiler + 'static) -> Self {
        Self {
            compiler: Box::new(compiler),
            shaders: HashMap::new(),
        }
    }

    pub fn get(&self, id: &str) -> Option<Rc<ShaderVariant>> {
        self.shaders.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.shaders.contains_key(id)
    }

    /// Registered ids in sorted order.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.shaders.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.shaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shaders.is_empty()
    }

    /// Loads one catalog entry, or the whole catalog for `"all"`. Entries that
    /// are already registered are left alone.
    pub fn define_builtin(&mut self, name: &str) -> Result<()> {
        if name == "all" {
            for entry in BUILTINS {
                self.add_builtin(entry)?;
            }
            return Ok(());
        }

        let entry = builtin::find(name).ok_or_else(|| ShadeError::UnknownBuiltin(name.to_string()))?;
        self.add_builtin(entry)
    }

    fn add_builtin(&mut self, entry: &Builtin) -> Result<()> {
        if self.contains(entry.name) {
            return Ok(());
        }

        info!(shader = entry.name, "loading predefined shader");
        let mut programs = compile_program_set(self.compiler.as_mut(), entry.source).map_err(
            |source| ShadeError::Compile {
                id: entry.name.to_string(),
                source,
            },
        )?;
        let args = entry.defaults();
        programs.prime(&args);

        let variant = ShaderVariant::new(
            entry.name,
            Rc::from(entry.source),
            Rc::new(RefCell::new(programs)),
            args,
            entry.transparent,
        );
        self.shaders.insert(entry.name.to_string(), Rc::new(variant));
        Ok(())
    }

    /// Creates a shader, or returns the registered one when `def.id` is taken.
    ///
    /// Deriving without new source shares the base's compiled programs; every
    /// override must then name a uniform the base declares. With new source the
    /// programs are compiled fresh and the overrides become its defaults, layered
    /// over the base's defaults when a base is given. Nothing is registered on
    /// failure.
    pub fn define(&mut self, def: ShaderDefinition) -> Result<Rc<ShaderVariant>> {
        if let Some(found) = self.shaders.get(&def.id) {
            return Ok(found.clone());
        }

        info!(shader = %def.id, from = ?def.from, "loading custom shader");

        let base = match def.from.as_deref() {
            Some(from) => Some(self.shaders.get(from).cloned().ok_or_else(|| {
                ShadeError::UnknownBaseShader {
                    id: def.id.clone(),
                    from: from.to_string(),
                }
            })?),
            None => None,
        };

        // Overrides are validated before any compilation.
        let inherits_programs = def.source.is_none() && base.is_some();
        let mut args = base
            .as_ref()
            .map(|base| base.args().clone())
            .unwrap_or_default();
        for (name, value) in &def.args {
            match args.get(name) {
                Some(existing) if !existing.same_shape(value) => {
                    return Err(ShadeError::UniformTypeMismatch {
                        shader: def.id.clone(),
                        uniform: name.clone(),
                        expected: existing.glsl_type(),
                        found: value.glsl_type(),
                    });
                }
                None if inherits_programs => {
                    return Err(ShadeError::UnknownUniform {
                        shader: def.id.clone(),
                        uniform: name.clone(),
                    });
                }
                _ => {}
            }
        }
        for (name, value) in &def.args {
            args.insert(name.clone(), *value);
        }

        let (glsl, programs): (Rc<str>, SharedPrograms) = match (&def.source, &base) {
            (Some(source), _) => {
                let glsl = read_source(source)?;
                let compiled = compile_program_set(self.compiler.as_mut(), &glsl).map_err(
                    |source| ShadeError::Compile {
                        id: def.id.clone(),
                        source,
                    },
                )?;
                (Rc::from(glsl), Rc::new(RefCell::new(compiled)))
            }
            (None, Some(base)) => (base.shared_source().clone(), base.programs().clone()),
            (None, None) => return Err(ShadeError::MissingSource(def.id)),
        };

        programs.borrow_mut().prime(&args);

        let transparent = def.transparency || base.as_ref().is_some_and(|base| base.transparent());
        let variant = Rc::new(ShaderVariant::new(def.id.clone(), glsl, programs, args, transparent));
        self.shaders.insert(def.id, variant.clone());
        Ok(variant)
    }

    /// Looks up a bare id, or derives and caches a parameterized specifier
    /// (`"<base> <name=value,...>"`) under the full specifier string.
    pub fn resolve(&mut self, specifier: &str) -> Result<Rc<ShaderVariant>> {
        match Specifier::parse(specifier) {
            Specifier::Bare(id) => self
                .get(id)
                .ok_or_else(|| ShadeError::ShaderNotFound(id.to_string())),
            Specifier::Parameterized { base, arguments } => {
                if let Some(found) = self.get(specifier) {
                    return Ok(found);
                }
                let overrides = UniformSet::parse_arguments(arguments).map_err(|source| {
                    ShadeError::InvalidArguments {
                        specifier: specifier.to_string(),
                        source,
                    }
                })?;
                debug!(specifier, base, "deriving shader from specifier");
                self.define(ShaderDefinition::derived(specifier, base, overrides))
            }
        }
    }

    /// Loads the configured builtins and custom shaders. Relative shader paths
    /// are resolved against `base_dir`.
    pub fn load_config(&mut self, config: &ShadeConfig, base_dir: &Path) -> Result<()> {
        config.validate()?;

        for name in &config.builtins {
            self.define_builtin(name)?;
        }

        for id in config.definition_order()? {
            let Some(entry) = config.shader(&id) else {
                continue;
            };

            let mut def = ShaderDefinition::new(id.as_str()).transparent(entry.transparency);
            def.from = entry.from.clone();
            if let Some(path) = &entry.path {
                let path = if path.is_absolute() {
                    path.clone()
                } else {
                    base_dir.join(path)
                };
                def = def.with_path(path);
            } else if let Some(glsl) = &entry.source {
                def = def.with_glsl(glsl.as_str());
            }
            for (name, value) in &entry.args {
                def.args.insert(name.as_str(), arg_value(&id, name, value)?);
            }

            self.define(def)?;
        }

        Ok(())
    }

    /// Drops every registered shader and hands each compiled program set that
    /// is no longer referenced back to the compile service.
    pub(crate) fn clear(&mut self) {
        let mut held: Vec<SharedPrograms> = Vec::new();
        for (_, variant) in self.shaders.drain() {
            if !held.iter().any(|programs| Rc::ptr_eq(programs, variant.programs())) {
                held.push(variant.programs().clone());
            }
        }

        let mut released = 0;
        for programs in held {
            match Rc::try_unwrap(programs) {
                Ok(programs) => {
                    for id in programs.into_inner().ids() {
                        self.compiler.release(id);
                        released += 1;
                    }
                }
                Err(programs) => {
                    warn!(
                        programs = ?programs.borrow().ids(),
                        "program set still in use; not released"
                    );
                }
            }
        }
        debug!(released, "unloaded window shaders");
    }
}

fn read_source(source: &ShaderSource) -> Result<String> {
    match source {
        ShaderSource::Glsl(glsl) => Ok(glsl.clone()),
        ShaderSource::Path(path) => fs::read_to_string(path).map_err(|source| ShadeError::Io {
            path: path.clone(),
            source,
        }),
    }
}

fn arg_value(id: &str, name: &str, value: &ArgValue) -> Result<UniformValue> {
    match value {
        ArgValue::Scalar(value) => Ok(UniformValue::Scalar(*value)),
        ArgValue::Vector(_) => value.as_vec3().map(UniformValue::Vec3).ok_or_else(|| {
            ShadeError::Config(ConfigError::Invalid(format!(
                "shader '{id}' arg '{name}' must have 3 components"
            )))
        }),
    }
}
