//! Predefined window shaders shipped with the engine.

use glprog::{UniformSet, UniformValue};

/// A catalog entry: GLSL source, declared uniform defaults, and whether the
/// shader can turn opaque pixels translucent.
#[derive(Debug)]
pub struct Builtin {
    pub name: &'static str,
    pub source: &'static str,
    defaults: &'static [(&'static str, UniformValue)],
    pub transparent: bool,
}

impl Builtin {
    pub fn defaults(&self) -> UniformSet {
        self.defaults.iter().map(|(name, value)| (*name, *value)).collect()
    }
}

/// Looks up a catalog entry by name.
pub fn find(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|builtin| builtin.name == name)
}

pub static BUILTINS: &[Builtin] = &[
    Builtin {
        name: "invert",
        source: INVERT,
        defaults: &[],
        transparent: false,
    },
    Builtin {
        name: "tint",
        source: TINT,
        defaults: &[
            ("tintColor", UniformValue::Vec3([1.0, 0.0, 0.0])),
            ("tintStrength", UniformValue::Scalar(0.1)),
        ],
        transparent: false,
    },
    Builtin {
        name: "chromakey",
        source: CHROMAKEY,
        defaults: &[
            ("bkg", UniformValue::Vec3([0.0, 0.0, 0.0])),
            ("similarity", UniformValue::Scalar(0.1)),
            ("amount", UniformValue::Scalar(1.4)),
            ("targetOpacity", UniformValue::Scalar(0.83)),
        ],
        transparent: true,
    },
    Builtin {
        name: "chromablur",
        source: CHROMABLUR,
        defaults: &[
            ("bkg", UniformValue::Vec3([0.172, 0.172, 0.172])),
            ("similarity", UniformValue::Scalar(0.15)),
            ("amount", UniformValue::Scalar(1.0)),
            ("targetOpacity", UniformValue::Scalar(0.4)),
            ("blurRadius", UniformValue::Scalar(0.002)),
            ("blurSteps", UniformValue::Scalar(2.0)),
        ],
        transparent: true,
    },
];

const INVERT: &str = r"
void windowShader(inout vec4 color) {
    color.rgb /= color.a;
    color.rgb = vec3(1.) - vec3(.88, .9, .92) * color.rgb;
    color.rgb = dot(vec3(0.26312, 0.5283, 0.10488), color.rgb) * 2.0 - color.rgb;
    color.rgb *= color.a;
}
";

const TINT: &str = r"
uniform vec3 tintColor;
uniform float tintStrength;

void windowShader(inout vec4 color) {
    color.rgb /= color.a;
    color.rgb = color.rgb * (1.0 - tintStrength) + tintColor * tintStrength;
    color.rgb *= color.a;
}
";

const CHROMAKEY: &str = r"
uniform vec3 bkg;
uniform float similarity;
uniform float amount;
uniform float targetOpacity;

void windowShader(inout vec4 color) {
    if (color.r >= bkg.r - similarity && color.r <= bkg.r + similarity &&
            color.g >= bkg.g - similarity && color.g <= bkg.g + similarity &&
            color.b >= bkg.b - similarity && color.b <= bkg.b + similarity) {
        vec3 error = vec3(abs(bkg.r - color.r), abs(bkg.g - color.g), abs(bkg.b - color.b));
        float avg_error = (error.r + error.g + error.b) / 3.0;

        color *= targetOpacity + (1.0 - targetOpacity) * avg_error * amount / similarity;
    }
}
";

const CHROMABLUR: &str = r"
uniform vec3 bkg;
uniform float similarity;
uniform float amount;
uniform float targetOpacity;
uniform float blurRadius;
uniform float blurSteps;

vec4 chromaKeyed(vec4 inColor) {
    if (inColor.r >= bkg.r - similarity && inColor.r <= bkg.r + similarity &&
            inColor.g >= bkg.g - similarity && inColor.g <= bkg.g + similarity &&
            inColor.b >= bkg.b - similarity && inColor.b <= bkg.b + similarity) {
        vec3 error = vec3(abs(bkg.r - inColor.r), abs(bkg.g - inColor.g), abs(bkg.b - inColor.b));
        float avg_error = (error.r + error.g + error.b) / 3.0;

        inColor *= targetOpacity + (1.0 - targetOpacity) * avg_error * amount / similarity;
    }
    return inColor;
}

void windowShader(inout vec4 color) {
    if (blurRadius <= 0.00001) {
        color = chromaKeyed(color);
        return;
    }

    vec4 sum = vec4(0.0);
    float totalWeight = 0.0;

    for (float x = -blurSteps; x <= blurSteps; x += 1.0) {
        for (float y = -blurSteps; y <= blurSteps; y += 1.0) {
            vec2 offset = vec2(x, y) * blurRadius;
            sum += chromaKeyed(texture2D(tex, v_texcoord + offset));
            totalWeight += 1.0;
        }
    }

    color = sum / totalWeight;
}
";
