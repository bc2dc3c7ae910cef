use criterion::{BatchSize, Bencher};
use decatur_drill::partition::Site;
use decatur_drill::{BoundingBox, Coord, PartitionBuilder};
use rand::rngs::StdRng;
use rand::SeedableRng;

pub fn decatur_box() -> BoundingBox {
    BoundingBox::from_coords(Coord::new(39.80, -89.05), Coord::new(39.90, -88.85))
}

/// Builder over `size` stations scattered uniformly inside the Decatur box.
pub fn create_random_builder(size: usize, seed: u64) -> PartitionBuilder {
    let mut rng = StdRng::seed_from_u64(seed);
    let bbox = decatur_box();
    let sites = (0..size)
        .map(|i| Site::new(i.to_string(), bbox.sample(&mut rng)))
        .collect();

    PartitionBuilder::default()
        .set_bounding_box(bbox)
        .set_sites(sites)
}

pub fn create_benchmark_fn(b: &mut Bencher, size: usize) {
    let mut seed = 0;
    b.iter_batched(
        || {
            seed += 1;
            create_random_builder(size, seed)
        },
        |b| b.build(),
        BatchSize::SmallInput);
}
