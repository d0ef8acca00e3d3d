use nn_shader::network::gaussian;
use nn_shader::{Activation, Connection, Layout, Network, ShaderGenerator, Topology};

const TOPOLOGIES: &[(&[usize], bool)] = &[
    (&[], false),
    (&[1], false),
    (&[2], false),
    (&[5, 5], false),
    (&[3, 7, 2], false),
    (&[1], true),
    (&[4], true),
    (&[6, 3], true),
    (&[8, 5, 4], true),
];

#[test]
fn shader_weight_order_matches_buffer_layout() {
    for &(hidden, rbf) in TOPOLOGIES {
        let t = Topology::new(hidden, rbf).unwrap();
        let layout = Layout::new(&t);
        let eq = ShaderGenerator::new(&t, Activation::for_topology(&t)).equations();

        assert_eq!(
            eq.weight_order(),
            layout.connections(&t).as_slice(),
            "{hidden:?} rbf={rbf}"
        );
        assert_eq!(eq.weight_order().len(), layout.weights_size());
        // One statement per non-input unit.
        let units: usize = t.sizes()[1..].iter().sum();
        assert_eq!(eq.lines().len(), units);
    }
}

#[test]
fn every_weight_index_appears_once_in_the_shader_text() {
    for &(hidden, rbf) in TOPOLOGIES {
        let t = Topology::new(hidden, rbf).unwrap();
        let n = Layout::new(&t).weights_size();
        let text = ShaderGenerator::new(&t, Activation::Tanh).equations().text();
        for i in 0..n {
            let needle = format!("weights[{i}]");
            assert_eq!(text.matches(&needle).count(), 1, "{needle} in {hidden:?} rbf={rbf}");
        }
        assert!(!text.contains(&format!("weights[{n}]")));
    }
}

#[test]
fn per_layer_weight_counts_add_up() {
    for &(hidden, rbf) in TOPOLOGIES {
        let t = Topology::new(hidden, rbf).unwrap();
        let layout = Layout::new(&t);
        let sizes = t.sizes();
        let expected: usize = (1..t.num_layers())
            .map(|l| {
                if t.is_rbf_layer(l) {
                    3 * sizes[l]
                } else {
                    (sizes[l - 1] + 1) * sizes[l]
                }
            })
            .sum();
        assert_eq!(layout.weights_size(), expected, "{hidden:?} rbf={rbf}");
    }
}

/// Evaluate a network by walking `order` the way the generated shader does,
/// looking each weight up by its position only.
fn interpret(t: &Topology, act: Activation, order: &[Connection], weights: &[f32], x: f32, y: f32) -> f64 {
    let mut prev = vec![f64::from(x), f64::from(y)];
    for layer in 1..t.num_layers() {
        let width = t.width(layer);
        let mut sums = vec![0.0_f64; width];
        let mut rbf = vec![[0.0_f64; 3]; width];
        for (conn, &w) in order.iter().zip(weights) {
            let w = f64::from(w);
            match *conn {
                Connection::RbfMeanX { unit } if layer == 1 && t.is_rbf() => rbf[unit][0] = w,
                Connection::RbfMeanY { unit } if layer == 1 && t.is_rbf() => rbf[unit][1] = w,
                Connection::RbfVariance { unit } if layer == 1 && t.is_rbf() => rbf[unit][2] = w,
                Connection::Bias { layer: l, unit } if l == layer => sums[unit] += w,
                Connection::Edge {
                    layer: l,
                    unit,
                    source,
                } if l == layer => sums[unit] += w * prev[source],
                _ => {}
            }
        }
        prev = if t.is_rbf_layer(layer) {
            rbf.iter()
                .map(|&[mx, my, var]| gaussian(prev[0], prev[1], mx, my, var))
                .collect()
        } else {
            sums.into_iter().map(|z| act.activate(z)).collect()
        };
    }
    prev[0]
}

#[test]
fn shader_order_evaluates_like_the_cpu_forward_pass() {
    let points = [(0.0, 0.0), (0.7, -0.3), (-1.5, 2.0), (3.0, 3.0)];
    for (seed, &(hidden, rbf)) in TOPOLOGIES.iter().enumerate() {
        let t = Topology::new(hidden, rbf).unwrap();
        let act = if rbf { Activation::Tanh } else { Activation::for_topology(&t) };
        let mut net = Network::new_with_seed(t.clone(), act, seed as u64);
        if rbf {
            // Random init leaves placeholder variances that may be negative.
            let span = net.layout().weights(1);
            for unit in net.weights_mut()[span.range()].chunks_exact_mut(3) {
                unit[2] = unit[2].abs() + 0.5;
            }
        }

        let order = ShaderGenerator::for_network(&net).equations().weight_order().to_vec();
        for &(x, y) in &points {
            let cpu = net.forward(x, y);
            let shader = interpret(&t, act, &order, net.weights(), x, y);
            assert!(
                (cpu - shader).abs() < 1e-12,
                "{hidden:?} rbf={rbf} at ({x}, {y}): {cpu} vs {shader}"
            );
        }
    }
}
