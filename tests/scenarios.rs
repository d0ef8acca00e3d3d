use std::io::Write;

use nn_shader::kmeans::{self, VARIANCE_SMOOTHING};
use nn_shader::{
    Activation, Dataset, KMeans, Label, Layout, Network, NetworkBuilder, Sample, Topology,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn blob(cx: f32, cy: f32, label: Label) -> Vec<Sample> {
    [(0.0, 0.0), (0.1, 0.0), (0.0, 0.1), (-0.1, 0.0), (0.0, -0.1), (0.05, 0.05)]
        .iter()
        .map(|&(dx, dy)| Sample::new(cx + dx, cy + dy, label))
        .collect()
}

fn centroid(samples: &[Sample]) -> (f64, f64) {
    let n = samples.len() as f64;
    let sx: f64 = samples.iter().map(|s| f64::from(s.x)).sum();
    let sy: f64 = samples.iter().map(|s| f64::from(s.y)).sum();
    (sx / n, sy / n)
}

#[test]
fn perceptron_step_output() {
    let t = Topology::new(&[], false).unwrap();
    let act = Activation::for_topology(&t);
    assert_eq!(act, Activation::Step);

    let mut net = Network::from_weights(t, act, vec![0.0, 1.0, -1.0]).unwrap();
    let out = net.forward(0.5, -0.5);
    assert_eq!(net.pre_activates(), &[1.0]);
    assert_eq!(out, 1.0);
}

#[test]
fn dataset_file_targets_are_signed() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "1\t1\t1\n-1\t-1\t0\n").unwrap();
    file.flush().unwrap();

    let data = Dataset::load(file.path()).unwrap();
    let targets: Vec<f64> = data.samples().iter().map(Sample::target).collect();
    assert_eq!(targets, vec![1.0, -1.0]);
    assert_eq!(data.samples()[1].label, Label::Negative);
}

#[test]
fn missing_dataset_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(Dataset::load(dir.path().join("nope.dat")).is_err());
}

#[test]
fn seeded_weights_have_layout_length() {
    let t = Topology::new(&[2], false).unwrap();
    assert_eq!(Layout::new(&t).weights_size(), (2 + 1) * 2 + (2 + 1));

    let a = Network::new_with_seed(t.clone(), Activation::Tanh, 1234);
    let b = Network::new_with_seed(t, Activation::Tanh, 1234);
    assert_eq!(a.weights().len(), 9);
    assert_eq!(a.weights(), b.weights());
    assert_eq!(a.weight_bytes().len(), 9 * 4);
}

#[test]
fn rbf_centers_land_on_cluster_centroids() {
    let left = blob(-3.0, -3.0, Label::Negative);
    let right = blob(3.0, 3.0, Label::Positive);
    let mut samples = left.clone();
    samples.extend_from_slice(&right);

    let expected = [centroid(&left), centroid(&right)];

    for seed in 0..8 {
        let trainer = NetworkBuilder::from_hidden(&[2])
            .unwrap()
            .rbf(true)
            .build_with_seed(Dataset::from_samples(samples.clone()), seed)
            .unwrap();
        let net = trainer.network();
        let rbf = &net.weights()[net.layout().weights(1).range()];

        let mut centers: Vec<(f64, f64, f64)> = rbf
            .chunks_exact(3)
            .map(|u| (f64::from(u[0]), f64::from(u[1]), f64::from(u[2])))
            .collect();
        centers.sort_by(|a, b| a.0.total_cmp(&b.0));

        for (c, e) in centers.iter().zip(&expected) {
            assert!((c.0 - e.0).abs() < 1e-5, "seed {seed}: {c:?} vs {e:?}");
            assert!((c.1 - e.1).abs() < 1e-5, "seed {seed}: {c:?} vs {e:?}");
            assert!(c.2 > VARIANCE_SMOOTHING * 0.99);
        }
    }
}

#[test]
fn converged_kmeans_is_a_fixed_point() {
    let mut samples = blob(-2.0, 1.0, Label::Negative);
    samples.extend(blob(2.0, 1.0, Label::Positive));
    samples.extend(blob(0.0, -2.0, Label::Positive));
    let mut data = Dataset::from_samples(samples);

    let mut rng = StdRng::seed_from_u64(5);
    let clusters = KMeans::new(3).unwrap().fit(&mut data, &mut rng).unwrap();

    let first = kmeans::assign(data.samples(), &clusters);
    let again = kmeans::assign(data.samples(), &clusters);
    assert_eq!(first, again);

    // Re-running from the converged centers changes nothing.
    let refit = KMeans::new(3)
        .unwrap()
        .fit_from(data.samples(), clusters.clone())
        .unwrap();
    assert_eq!(kmeans::assign(data.samples(), &refit), first);
    for (a, b) in clusters.iter().zip(&refit) {
        assert!((a.mean_x - b.mean_x).abs() < 1e-12);
        assert!((a.mean_y - b.mean_y).abs() < 1e-12);
        assert!((a.variance - b.variance).abs() < 1e-12);
    }
}
