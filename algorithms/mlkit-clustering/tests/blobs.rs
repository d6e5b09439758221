use approx::assert_abs_diff_eq;
use mlkit::prelude::*;
use mlkit_clustering::{BisectingKMeans, KMeans, KMeansInit};
use mlkit_datasets::generate;
use ndarray::{array, Array2};
use ndarray_rand::rand::SeedableRng;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand_xoshiro::Xoshiro256Plus;

fn well_separated_blobs(seed: u64) -> DataSet<f64> {
    let mut rng = Xoshiro256Plus::seed_from_u64(seed);
    let centroids = array![[-20., -20.], [20., 20.], [20., -20.]];
    DataSet::new(generate::blobs(50, &centroids, &mut rng))
}

#[test]
fn splitting_reduces_error() {
    let dataset = well_separated_blobs(42);

    let unsplit = BisectingKMeans::params().build(&dataset, 1).unwrap();
    let split = BisectingKMeans::params().build(&dataset, 2).unwrap();

    assert!(split.sse() <= 0.9 * unsplit.sse());
    assert_abs_diff_eq!(
        unsplit.sse(),
        KMeans::params().build(&dataset, 1).unwrap().sse(),
        epsilon = 1e-6
    );
}

#[test]
fn bisecting_recovers_blobs() {
    let dataset = well_separated_blobs(7);
    let model = BisectingKMeans::params()
        .random_seed(7)
        .build(&dataset, 3)
        .unwrap();

    assert_eq!(model.n_clusters(), 3);
    assert!(is_partition(model.clusters(), dataset.nsamples()));
    // every blob ends up in its own cluster
    for cluster in model.clusters() {
        let blob = cluster.indices()[0] / 50;
        assert_eq!(cluster.len(), 50);
        assert!(cluster.indices().iter().all(|idx| idx / 50 == blob));
    }
}

#[test]
fn bisecting_is_not_worse_than_k_means_on_separated_blobs() {
    let dataset = well_separated_blobs(3);
    let bisecting = BisectingKMeans::params().build(&dataset, 3).unwrap();
    let k_means = KMeans::params()
        .init_method(KMeansInit::KMeansPlusPlus)
        .build(&dataset, 3)
        .unwrap();

    assert!(bisecting.sse() <= k_means.sse() * (1. + 1e-9));
}

#[test]
fn k_means_memberships_follow_clusters() {
    let mut rng = Xoshiro256Plus::seed_from_u64(1);
    let records: Array2<f64> = Array2::random_using((100, 4), Uniform::new(-1., 1.), &mut rng);
    let dataset = DataSet::new(records);
    let model = KMeans::params().build(&dataset, 6).unwrap();
    assert!(model.converged());

    let memberships = model.memberships();
    for (pos, cluster) in model.clusters().iter().enumerate() {
        assert!(cluster.indices().iter().all(|&idx| memberships[idx] == pos));
    }
    assert_eq!(model.predict(&dataset.records()), memberships);
}
