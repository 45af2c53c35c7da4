use crate::program::{Program, ProgramId, ProgramKind, ProgramSet};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    #[error("window shader source is empty")]
    EmptySource,
    #[error("window shader source does not define `void windowShader(inout vec4 color)`")]
    MissingEntryPoint,
    #[error("{kind} program failed to compile: {message}")]
    Rejected { kind: ProgramKind, message: String },
}

/// Result of compiling one program: its id and the active uniforms with their
/// locations, as the driver reports them after linking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledProgram {
    pub id: ProgramId,
    pub uniforms: Vec<(String, i32)>,
}

/// Turns assembled fragment source into a runnable program.
pub trait ProgramCompiler {
    fn compile(&mut self, kind: ProgramKind, source: &str) -> Result<CompiledProgram, CompileError>;

    /// Frees a program handed out by [`ProgramCompiler::compile`] once nothing
    /// uses it any more.
    fn release(&mut self, _program: ProgramId) {}
}

/// Compiles the window shader into all four program kinds.
pub fn compile_program_set(
    compiler: &mut dyn ProgramCompiler,
    window_shader: &str,
) -> Result<ProgramSet, CompileError> {
    if window_shader.trim().is_empty() {
        return Err(CompileError::EmptySource);
    }

    let mut compiled_ids = Vec::with_capacity(ProgramKind::ALL.len());
    let result = ProgramSet::try_from_fn(|kind| -> Result<Program, CompileError> {
        let source = assemble(kind, window_shader);
        let compiled = compiler.compile(kind, &source)?;
        tracing::debug!(kind = %kind, program = compiled.id.0, "compiled window shader program");
        compiled_ids.push(compiled.id);
        Ok(Program::new(kind, compiled))
    });

    if result.is_err() {
        for id in compiled_ids {
            compiler.release(id);
        }
    }
    result
}

/// Produces the complete fragment program for `kind`.
///
/// `#version` directives are dropped from the window shader so the prelude's
/// own version line stays first; the epilogue samples the texture, hands the
/// color to `windowShader`, then applies the renderer's alpha.
pub fn assemble(kind: ProgramKind, window_shader: &str) -> String {
    let mut sanitized = String::new();
    for line in window_shader.lines() {
        if line.trim_start().starts_with("#version") {
            continue;
        }
        sanitized.push_str(line);
        sanitized.push('\n');
    }

    let (prelude, epilogue) = match kind {
        ProgramKind::Ext => (EXT_PRELUDE, SAMPLED_EPILOGUE),
        ProgramKind::Rgba => (RGBA_PRELUDE, SAMPLED_EPILOGUE),
        ProgramKind::Rgbx => (RGBA_PRELUDE, RGBX_EPILOGUE),
        ProgramKind::Cm => (CM_PRELUDE, CM_EPILOGUE),
    };

    format!("{prelude}\n#line 1\n{sanitized}{epilogue}")
}

/// A `uniform <type> <name>;` line found in shader source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformDeclaration {
    pub glsl_type: String,
    pub name: String,
}

/// Collects top-level uniform declarations in source order. Precision
/// qualifiers are skipped; array suffixes are kept on the name.
pub fn uniform_declarations(source: &str) -> Vec<UniformDeclaration> {
    source
        .lines()
        .filter_map(|line| {
            let rest = line.trim().strip_prefix("uniform ")?;
            let rest = rest.split(';').next()?;
            let tokens: Vec<&str> = rest.split_whitespace().collect();
            match tokens.as_slice() {
                [.., glsl_type, name] => Some(UniformDeclaration {
                    glsl_type: glsl_type.to_string(),
                    name: name.to_string(),
                }),
                _ => None,
            }
        })
        .collect()
}

const RGBA_PRELUDE: &str = r"#version 100
precision highp float;
varying vec2 v_texcoord;
uniform sampler2D tex;
uniform float alpha;
";

const EXT_PRELUDE: &str = r"#version 100
#extension GL_OES_EGL_image_external : require
precision highp float;
varying vec2 v_texcoord;
uniform samplerExternalOES tex;
uniform float alpha;
";

const CM_PRELUDE: &str = r"#version 100
precision highp float;
varying vec2 v_texcoord;
uniform sampler2D tex;
uniform float alpha;
uniform int sourceTF;
uniform int targetTF;

vec3 windowshade_to_linear(vec3 color, int tf) {
    if (tf == 1) {
        return pow(color, vec3(2.2));
    }
    return color;
}

vec3 windowshade_from_linear(vec3 color, int tf) {
    if (tf == 1) {
        return pow(color, vec3(1.0 / 2.2));
    }
    return color;
}
";

const SAMPLED_EPILOGUE: &str = r"
void main() {
    vec4 pixColor = texture2D(tex, v_texcoord);
    windowShader(pixColor);
    gl_FragColor = pixColor * alpha;
}
";

const RGBX_EPILOGUE: &str = r"
void main() {
    vec4 pixColor = vec4(texture2D(tex, v_texcoord).rgb, 1.0);
    windowShader(pixColor);
    gl_FragColor = pixColor * alpha;
}
";

const CM_EPILOGUE: &str = r"
void main() {
    vec4 pixColor = texture2D(tex, v_texcoord);
    pixColor.rgb = windowshade_to_linear(pixColor.rgb, sourceTF);
    windowShader(pixColor);
    pixColor.rgb = windowshade_from_linear(pixColor.rgb, targetTF);
    gl_FragColor = pixColor * alpha;
}
";
