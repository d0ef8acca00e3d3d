//! GLSL fragment-shader generator.
//!
//! The generated program evaluates the same network as [`Network::forward`]
//! for every pixel, reading the same flat weight array from a bindable
//! uniform. `weights[w]` in the shader text must address exactly the logical
//! connection that `Network::weights()[w]` holds on the CPU, so the generator
//! walks the topology in buffer order: RBF layer first (if any), then every
//! weighted-sum layer; units in index order; per unit the bias then each
//! source unit.
//!
//! Every unit value is bound to `v{layer:04x}{unit:04x}` (the inputs are
//! `v00000000` and `v00000001`); the output unit is bound to [`OUTPUT_NAME`].
//!
//! [`Network::forward`]: crate::Network::forward

use std::fmt::Write as _;

use crate::{Activation, Connection, Error, Layout, Network, Result, Topology};

/// Name the output unit's value is bound to.
pub const OUTPUT_NAME: &str = "val";
/// `uniform float weights[N]`; upload [`Network::weights`] here.
pub const WEIGHTS_UNIFORM: &str = "weights";
/// One pixel in texture-coordinate space.
pub const STEP_UNIFORM: &str = "pixelStep";
/// Half a pixel in texture-coordinate space.
pub const HALF_STEP_UNIFORM: &str = "halfPixelStep";

/// Outputs at or below `-CLASS_THRESHOLD` (or at or above `+CLASS_THRESHOLD`) are
/// painted as a confident class; anything in between as unclassified.
pub const CLASS_THRESHOLD: f32 = 0.8;

/// GLSL definition of the Gaussian basis used by RBF units.
///
/// Squares through `dot` rather than `pow`, which is undefined for a negative
/// base in GLSL.
pub const RBF_GLSL: &str = "float rbf(vec2 x, vec2 mean, float var) {
  vec2 d = x - mean;
  return exp(-dot(d, d) / (2.0 * var));
}";

/// Variable name bound to unit `unit` of `layer`.
pub fn unit_name(layer: usize, unit: usize) -> String {
    format!("v{layer:04x}{unit:04x}")
}

/// Generated per-unit statements plus the weight each `weights[i]` names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Equations {
    lines: Vec<String>,
    weight_order: Vec<Connection>,
}

impl Equations {
    /// One statement per unit, in evaluation order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// `weight_order()[i]` is the connection the text reads as `weights[i]`.
    pub fn weight_order(&self) -> &[Connection] {
        &self.weight_order
    }

    pub fn text(&self) -> String {
        self.lines.concat()
    }

    fn weight(&mut self, conn: Connection) -> usize {
        self.weight_order.push(conn);
        self.weight_order.len() - 1
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ShaderGenerator<'a> {
    topology: &'a Topology,
    activation: Activation,
}

impl<'a> ShaderGenerator<'a> {
    pub fn new(topology: &'a Topology, activation: Activation) -> Self {
        Self {
            topology,
            activation,
        }
    }

    /// Generator for the exact topology and activation `network` trains with.
    pub fn for_network(network: &'a Network) -> Self {
        Self::new(network.topology(), network.activation())
    }

    pub fn equations(&self) -> Equations {
        let t = self.topology;
        let mut eq = Equations {
            lines: Vec::new(),
            weight_order: Vec::new(),
        };
        let input = [unit_name(0, 0), unit_name(0, 1)];
        let last = t.output_layer();

        for layer in 1..t.num_layers() {
            for unit in 0..t.width(layer) {
                let name = if layer == last {
                    OUTPUT_NAME.to_owned()
                } else {
                    unit_name(layer, unit)
                };

                if t.is_rbf_layer(layer) {
                    let mx = eq.weight(Connection::RbfMeanX { unit });
                    let my = eq.weight(Connection::RbfMeanY { unit });
                    let var = eq.weight(Connection::RbfVariance { unit });
                    eq.lines.push(format!(
                        "  float {name} = rbf(vec2({}, {}), vec2({WEIGHTS_UNIFORM}[{mx}], {WEIGHTS_UNIFORM}[{my}]), {WEIGHTS_UNIFORM}[{var}]);\n",
                        input[0], input[1]
                    ));
                    continue;
                }

                let bias = eq.weight(Connection::Bias { layer, unit });
                let mut line = format!("  float {name} = activate({WEIGHTS_UNIFORM}[{bias}]");
                for source in 0..t.width(layer - 1) {
                    let w = eq.weight(Connection::Edge {
                        layer,
                        unit,
                        source,
                    });
                    write!(
                        line,
                        " + {WEIGHTS_UNIFORM}[{w}] * {}",
                        unit_name(layer - 1, source)
                    )
                    .expect("writing to a String cannot fail");
                }
                line.push_str(");\n");
                eq.lines.push(line);
            }
        }

        eq
    }

    /// Full fragment program for a weight array of `weights_size` floats.
    ///
    /// Fails if `weights_size` is not the number of weights the topology
    /// reads. Debug builds also check the emitted index order against
    /// [`Layout::connections`].
    pub fn fragment_shader(&self, weights_size: usize) -> Result<String> {
        let eq = self.equations();
        if eq.weight_order.len() != weights_size {
            return Err(Error::InvalidConfig(format!(
                "shader reads {} weights but the buffer holds {weights_size}",
                eq.weight_order.len()
            )));
        }
        debug_assert_eq!(
            eq.weight_order,
            Layout::new(self.topology).connections(self.topology),
            "shader weight order diverged from the buffer layout"
        );

        let rbf = if self.topology.is_rbf() { RBF_GLSL } else { "" };
        Ok(fragment_template(
            weights_size,
            self.activation.glsl(),
            rbf,
            &eq.text(),
        ))
    }
}

fn fragment_template(weights_size: usize, activation: &str, rbf: &str, equations: &str) -> String {
    let in_x = unit_name(0, 0);
    let in_y = unit_name(0, 1);
    format!(
        "#version 120
#extension GL_EXT_bindable_uniform : require
uniform vec2 {STEP_UNIFORM};
uniform vec2 {HALF_STEP_UNIFORM};
bindable uniform float {WEIGHTS_UNIFORM}[{weights_size}];
varying vec2 ftexcoord;

{activation}

{rbf}

vec4 classify(vec2 pos) {{
  float {in_x} = pos.x;
  float {in_y} = pos.y;
{equations}  float class1 = step({OUTPUT_NAME}, -{CLASS_THRESHOLD:?});
  float class2 = step({CLASS_THRESHOLD:?}, {OUTPUT_NAME});
  float unclass = 1.0 - class1 - class2;
  return class1 * vec4(0.25, 0.25, 0.25, 1.0) + class2 * vec4(0.0, 0.0, 0.75, 1.0) + unclass * vec4(0.75, 0.0, 0.0, 1.0);
}}

void main(void) {{
  vec2 corner = ftexcoord - {HALF_STEP_UNIFORM};
  gl_FragColor = (classify(corner)
    + classify(vec2(corner.x + {STEP_UNIFORM}.x, corner.y))
    + classify(vec2(corner.x, corner.y + {STEP_UNIFORM}.y))
    + classify(corner + {STEP_UNIFORM})) / 4.0;
}}
"
    )
}
