/*
MIT License

Copyright (c) 2025 Ameyanagi

All rights reserved.
*/

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mpdf_rs::atoms::{ComplexVector3D, Lattice, Vector3D};
use mpdf_rs::magnetic::{MagSpecies, MagStructure};
use mpdf_rs::mpdf::{share, MPDFCalculator, MpdfParameters};

fn mno_species(rmax: f64) -> MagSpecies {
    let fcc = vec![
        Vector3D::new(0.0, 0.0, 0.0),
        Vector3D::new(0.5, 0.5, 0.0),
        Vector3D::new(0.5, 0.0, 0.5),
        Vector3D::new(0.0, 0.5, 0.5),
    ];
    let spin = ComplexVector3D::from_real(Vector3D::new(0.0, 0.0, 2.5));
    MagSpecies::from_lattice(Lattice::cubic(4.445).unwrap(), fcc, vec![spin; 4])
        .with_label("Mn")
        .with_kvecs(vec![Vector3D::new(0.5, 0.5, 0.5)])
        .with_ff_key("Mn2")
        .with_rmax(rmax)
}

fn mno_structure(rmax: f64) -> MagStructure {
    let mut structure = MagStructure::new();
    structure.load_species(mno_species(rmax)).unwrap();
    structure.make_all().unwrap();
    structure
}

fn generation_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Generation");

    group.bench_function("mno_atoms_and_spins_r20", |b| {
        b.iter(|| {
            let mut structure = MagStructure::new();
            structure.load_species(mno_species(black_box(20.0))).unwrap();
            structure.make_atoms().unwrap();
            structure.make_spins().unwrap();
            black_box(structure.num_atoms())
        })
    });

    group.finish();
}

fn calculator_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("mPDF");
    group.sample_size(20);

    let calculator = MPDFCalculator::new(share(mno_structure(20.0)));
    group.bench_function("mno_normalized_representative", |b| {
        b.iter(|| black_box(calculator.calc_normalized().unwrap()))
    });

    let params = MpdfParameters {
        qmax: Some(25.0),
        qdamp: 0.02,
        ..MpdfParameters::default()
    };
    let calculator = MPDFCalculator::with_parameters(share(mno_structure(20.0)), params);
    group.bench_function("mno_all_outputs_terminated", |b| {
        b.iter(|| black_box(calculator.calc_all().unwrap()))
    });

    let mut structure = mno_structure(12.0);
    structure.use_all_atoms_for_calc();
    let calculator = MPDFCalculator::new(share(structure));
    group.bench_function("mno_all_centres_r12", |b| {
        b.iter(|| black_box(calculator.calc_unnormalized().unwrap()))
    });

    group.finish();
}

criterion_group!(benches, generation_benchmark, calculator_benchmark);
criterion_main!(benches);
