use criterion::{
    black_box, criterion_group, criterion_main, AxisScale, BenchmarkId, Criterion,
    PlotConfiguration,
};
use mlkit::traits::Build;
use mlkit::DataSet;
use mlkit_clustering::{BisectingKMeans, KMeans, KMeansInit};
use mlkit_datasets::generate;
use ndarray::Array2;
use ndarray_rand::rand::SeedableRng;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand_xoshiro::Xoshiro256Plus;

fn k_means_bench(c: &mut Criterion) {
    let mut rng = Xoshiro256Plus::seed_from_u64(40);
    let cluster_sizes = vec![(100, 4), (400, 10), (3000, 10)];

    let mut benchmark = c.benchmark_group("k_means");
    benchmark.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));
    for (cluster_size, n_clusters) in cluster_sizes {
        let rng = &mut rng;
        let n_features = 3;
        let centroids =
            Array2::random_using((n_clusters, n_features), Uniform::new(-30., 30.), rng);
        let dataset = DataSet::new(generate::blobs(cluster_size, &centroids, rng));

        benchmark.bench_function(BenchmarkId::new("lloyd", cluster_size), |bencher| {
            bencher.iter(|| {
                KMeans::params_with_rng(black_box(rng.clone()))
                    .init_method(KMeansInit::KMeansPlusPlus)
                    .max_n_iterations(black_box(1000))
                    .build(&dataset, black_box(n_clusters))
                    .unwrap()
            });
        });
        benchmark.bench_function(BenchmarkId::new("bisecting", cluster_size), |bencher| {
            bencher.iter(|| {
                BisectingKMeans::params_with_rng(black_box(rng.clone()))
                    .restarts(black_box(3))
                    .build(&dataset, black_box(n_clusters))
                    .unwrap()
            });
        });
    }

    benchmark.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default();
    targets = k_means_bench
}
criterion_main!(benches);
