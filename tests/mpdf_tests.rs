/*
MIT License

Copyright (c) 2025 Ameyanagi

All rights reserved.
*/

use approx::assert_relative_eq;
use mpdf_rs::atoms::{AtomSite, ComplexVector3D, CrystalStructure, Lattice, Vector3D};
use mpdf_rs::magnetic::{MagSpecies, MagStructure};
use mpdf_rs::mpdf::{share, MPDFCalculator, MpdfError, MpdfParameters};
use ndarray::{array, Array2};
use rstest::rstest;

/// Two atoms 4 Å apart along x with spins along ±z
fn dimer_structure(second_spin: f64) -> MagStructure {
    MagStructure::from_arrays(
        array![[0.0, 0.0, 0.0], [4.0, 0.0, 0.0]],
        array![[0.0, 0.0, 1.0], [0.0, 0.0, second_spin]],
    )
    .unwrap()
}

fn calculator_for(structure: MagStructure, rmax: f64) -> MPDFCalculator {
    let params = MpdfParameters {
        rmax,
        ..MpdfParameters::default()
    };
    MPDFCalculator::with_parameters(share(structure), params)
}

fn index_of(r: &[f64], value: f64) -> usize {
    r.iter()
        .enumerate()
        .min_by(|a, b| (a.1 - value).abs().total_cmp(&(b.1 - value).abs()))
        .map(|(i, _)| i)
        .unwrap()
}

fn strongest(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.abs().total_cmp(&b.1.abs()))
        .map(|(i, _)| i)
        .unwrap()
}

/// Simple-cubic antiferromagnet with a = 3 Å, k = (½, ½, ½)
fn cubic_antiferromagnet(rmax: f64) -> MagStructure {
    let species = MagSpecies::from_lattice(
        Lattice::cubic(3.0).unwrap(),
        vec![Vector3D::origin()],
        vec![ComplexVector3D::from_real(Vector3D::new(0.0, 0.0, 1.0))],
    )
    .with_label("M")
    .with_kvecs(vec![Vector3D::new(0.5, 0.5, 0.5)])
    .with_rmax(rmax);

    let mut structure = MagStructure::new();
    structure.load_species(species).unwrap();
    structure.make_all().unwrap();
    structure
}

#[test]
fn test_antiferromagnetic_dimer_has_negative_peak_at_separation() {
    let calculator = calculator_for(dimer_structure(-1.0), 15.0);
    let r = calculator.r_grid().unwrap();
    let f = calculator.calc_normalized().unwrap();

    assert_eq!(f.len(), r.len());
    let peak = strongest(&f);
    assert_relative_eq!(r[peak], 4.0, epsilon = 0.011);
    assert!(f[peak] < 0.0);
}

#[test]
fn test_ferromagnetic_dimer_flips_peak_sign_only() {
    let afm = calculator_for(dimer_structure(-1.0), 15.0).calc_all().unwrap();
    let fm = calculator_for(dimer_structure(1.0), 15.0).calc_all().unwrap();

    let at_four = index_of(&afm.r, 4.0);
    assert!(afm.normalized[at_four] < 0.0);
    assert!(fm.normalized[at_four] > 0.0);
    assert_eq!(strongest(&afm.normalized), strongest(&fm.normalized));
    for (a, f) in afm.unnormalized.iter().zip(&fm.unnormalized) {
        assert_relative_eq!(*a, -*f, epsilon = 1e-14);
    }
}

#[test]
fn test_output_length_matches_grid() {
    let mut calculator = calculator_for(cubic_antiferromagnet(8.0), 10.0);
    calculator.params.rmin = 1.0;
    calculator.params.rstep = 0.02;
    let r = calculator.r_grid().unwrap();
    assert_eq!(r.len(), 451);

    let profile = calculator.calc_all().unwrap();
    assert_eq!(profile.r, r);
    assert_eq!(profile.normalized.len(), r.len());
    assert_eq!(profile.unnormalized.len(), r.len());
    assert_eq!(profile.total.len(), r.len());
}

#[test]
fn test_permutation_invariance() {
    let structure = cubic_antiferromagnet(6.0);
    let n = structure.num_atoms();
    let order: Vec<usize> = (0..n).rev().collect();

    let atoms = structure.atoms().select(ndarray::Axis(0), &order);
    let spins = structure.spins().select(ndarray::Axis(0), &order);
    let mut permuted = MagStructure::from_arrays(atoms, spins).unwrap();
    let mut original = MagStructure::from_arrays(structure.atoms().to_owned(), structure.spins().to_owned()).unwrap();
    permuted.use_all_atoms_for_calc();
    original.use_all_atoms_for_calc();

    let a = calculator_for(original, 8.0).calc_all().unwrap();
    let b = calculator_for(permuted, 8.0).calc_all().unwrap();
    for (x, y) in a.unnormalized.iter().zip(&b.unnormalized) {
        assert_relative_eq!(*x, *y, epsilon = 1e-10, max_relative = 1e-9);
    }
}

#[test]
fn test_double_negation_restores_signal() {
    let structure = share(dimer_structure(-1.0));
    let calculator = MPDFCalculator::new(structure.clone());
    let before = calculator.calc_unnormalized().unwrap();

    for _ in 0..2 {
        let mut guard = structure.write().unwrap();
        guard.spins_mut().mapv_inplace(|s| -s);
    }
    let after = calculator.calc_unnormalized().unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_global_rotation_keeps_peak_position() {
    let structure = share(dimer_structure(-1.0));
    let calculator = MPDFCalculator::with_parameters(
        structure.clone(),
        MpdfParameters {
            rmax: 15.0,
            ..MpdfParameters::default()
        },
    );
    let before = calculator.calc_unnormalized().unwrap();

    // 45° about y leaves half of each spin perpendicular to the bond
    structure
        .write()
        .unwrap()
        .rotate_spins(&Vector3D::new(0.0, 1.0, 0.0), std::f64::consts::FRAC_PI_4);
    let after = calculator.calc_unnormalized().unwrap();

    // the tail term tilts the peak by less than one grid step
    let peak = strongest(&before);
    assert!((strongest(&after) as i64 - peak as i64).abs() <= 1);
    assert!(after[peak] < 0.0);
    assert!(after[peak].abs() < before[peak].abs());

    // rotation about the bond axis changes nothing
    structure
        .write()
        .unwrap()
        .rotate_spins(&Vector3D::new(1.0, 0.0, 0.0), 1.1);
    let about_bond = calculator.calc_unnormalized().unwrap();
    for (x, y) in after.iter().zip(&about_bond) {
        assert_relative_eq!(*x, *y, epsilon = 1e-12);
    }
}

#[test]
fn test_infinite_correlation_length_matches_very_large() {
    let mut undamped = cubic_antiferromagnet(6.0);
    let mut damped = undamped.copy();
    undamped.set_corr_length(f64::INFINITY).unwrap();
    damped.set_corr_length(1e12).unwrap();

    let a = calculator_for(undamped, 8.0).calc_normalized().unwrap();
    let b = calculator_for(damped, 8.0).calc_normalized().unwrap();
    for (x, y) in a.iter().zip(&b) {
        assert_relative_eq!(*x, *y, epsilon = 1e-9, max_relative = 1e-9);
    }
}

#[test]
fn test_short_correlation_length_damps_distant_peaks() {
    let mut structure = cubic_antiferromagnet(9.0);
    let calculator = calculator_for(structure.copy(), 8.0);
    let r = calculator.r_grid().unwrap();
    let full = calculator.calc_normalized().unwrap();
    structure.set_corr_length(2.0).unwrap();
    let damped = calculator_for(structure, 8.0).calc_normalized().unwrap();

    // nearest neighbour at 3 Å, second shell at 3√2 Å
    let near = index_of(&r, 3.0);
    let far = index_of(&r, 3.0 * 2f64.sqrt());
    assert_relative_eq!(damped[near] / full[near], (-1.5_f64).exp(), max_relative = 0.05);
    assert!(damped[far].abs() / full[far].abs() < damped[near].abs() / full[near].abs());
}

#[rstest]
#[case(true)]
#[case(false)]
fn test_zero_ord_scale_gives_zero_pair_term(#[case] normalized: bool) {
    let mut calculator = calculator_for(cubic_antiferromagnet(6.0), 8.0);
    calculator.params.ord_scale = 0.0;
    let values = calculator.calc(normalized).unwrap();
    assert!(values.iter().all(|&v| v == 0.0));
}

#[test]
fn test_ord_scale_is_linear() {
    let mut calculator = calculator_for(cubic_antiferromagnet(6.0), 8.0);
    let unit = calculator.calc_unnormalized().unwrap();
    calculator.params.ord_scale = 2.5;
    let scaled = calculator.calc_unnormalized().unwrap();
    for (u, s) in unit.iter().zip(&scaled) {
        assert_relative_eq!(2.5 * u, *s, epsilon = 1e-14, max_relative = 1e-12);
    }
}

#[test]
fn test_deep_copy_gives_identical_output() {
    let calculator = calculator_for(cubic_antiferromagnet(6.0), 8.0);
    let copy = calculator.deep_copy().unwrap();
    assert_eq!(calculator.calc_all().unwrap(), copy.calc_all().unwrap());

    // the copy owns its structure
    copy.structure()
        .write()
        .unwrap()
        .spins_mut()
        .fill(0.0);
    assert!(copy.calc_normalized().unwrap().iter().all(|&v| v == 0.0));
    assert!(calculator.calc_normalized().unwrap().iter().any(|&v| v != 0.0));
}

#[test]
fn test_calculator_sees_spin_changes_without_reattaching() {
    let structure = share(dimer_structure(-1.0));
    let calculator = MPDFCalculator::new(structure.clone());
    let clone = calculator.clone();
    let at_four = index_of(&calculator.r_grid().unwrap(), 4.0);
    assert!(calculator.calc_normalized().unwrap()[at_four] < 0.0);

    structure
        .write()
        .unwrap()
        .set_spin(1, Vector3D::new(0.0, 0.0, 1.0))
        .unwrap();
    assert!(calculator.calc_normalized().unwrap()[at_four] > 0.0);
    assert!(clone.calc_normalized().unwrap()[at_four] > 0.0);
}

#[test]
fn test_repeated_calls_are_deterministic() {
    let calculator = calculator_for(cubic_antiferromagnet(10.0), 10.0);
    let first = calculator.calc_all().unwrap();
    for _ in 0..3 {
        assert_eq!(first, calculator.calc_all().unwrap());
    }
}

#[test]
fn test_invalid_ranges_are_rejected_at_call_time() {
    let mut calculator = calculator_for(dimer_structure(-1.0), 15.0);
    calculator.params.rmin = 15.0;
    assert!(matches!(calculator.calc_all(), Err(MpdfError::InvalidRange(_))));
    calculator.params.rmin = 0.0;
    calculator.params.rstep = -0.01;
    assert!(matches!(calculator.r_grid(), Err(MpdfError::InvalidRange(_))));
}

#[test]
fn test_coincident_atoms_are_tolerated() {
    let structure = MagStructure::from_arrays(
        array![[0.0, 0.0, 0.0], [0.0, 0.0, 0.0], [4.0, 0.0, 0.0]],
        array![[0.0, 0.0, 1.0], [0.0, 0.0, 1.0], [0.0, 0.0, -1.0]],
    )
    .unwrap();
    let profile = calculator_for(structure, 10.0).calc_all().unwrap();
    assert!(profile.normalized.iter().all(|v| v.is_finite()));
    assert!(profile.total.iter().all(|v| v.is_finite()));
}

#[test]
fn test_zero_spins_give_zero_profile() {
    let structure = MagStructure::from_arrays(Array2::zeros((3, 3)), Array2::zeros((3, 3))).unwrap();
    let profile = calculator_for(structure, 10.0).calc_all().unwrap();
    assert!(profile.normalized.iter().all(|&v| v == 0.0));
    assert!(profile.unnormalized.iter().all(|&v| v == 0.0));
    assert!(profile.total.iter().all(|&v| v == 0.0));
}

#[test]
fn test_self_term_scales_with_para_scale_and_sits_near_origin() {
    let mut calculator = calculator_for(cubic_antiferromagnet(6.0), 8.0);
    let unit = calculator.calc_self_term().unwrap();
    assert!(strongest(&unit) < 100);

    calculator.params.para_scale = 0.0;
    assert!(calculator.calc_self_term().unwrap().iter().all(|&v| v == 0.0));

    let profile = calculator.calc_all().unwrap();
    assert_eq!(profile.total, profile.unnormalized);
}

#[test]
fn test_repeated_struc_idxs_do_not_double_self_term() {
    let mut crystal = CrystalStructure::new(Lattice::cubic(3.0).unwrap());
    crystal
        .add_site(AtomSite::new("Fe1", "Fe", Vector3D::origin()))
        .unwrap();

    let build = |idxs: Vec<usize>| {
        let species = MagSpecies::from_crystal(crystal.clone(), idxs)
            .with_basis_vecs(vec![ComplexVector3D::from_real(Vector3D::new(0.0, 0.0, 2.0))])
            .with_ff_key("Fe3")
            .with_rmax(6.0);
        let mut structure = MagStructure::new();
        structure.load_species(species).unwrap();
        structure.make_all().unwrap();
        structure
    };

    let once = build(vec![0]);
    let twice = build(vec![0, 0]);
    assert_eq!(once.num_atoms(), twice.num_atoms());
    assert_eq!(once.calc_idxs(), twice.calc_idxs());
    assert_eq!(
        calculator_for(once, 8.0).calc_self_term().unwrap(),
        calculator_for(twice, 8.0).calc_self_term().unwrap()
    );

    let mut explicit = build(vec![0]);
    let single = calculator_for(explicit.copy(), 8.0);
    explicit.set_calc_idxs(vec![0, 0]).unwrap();
    assert_eq!(explicit.calc_idxs(), &[0]);
    assert_eq!(
        single.calc_self_term().unwrap(),
        calculator_for(explicit, 8.0).calc_self_term().unwrap()
    );
}

#[test]
fn test_termination_filter_adds_ripples() {
    let mut calculator = calculator_for(dimer_structure(-1.0), 15.0);
    let sharp = calculator.calc_normalized().unwrap();
    calculator.params.qmax = Some(10.0);
    let filtered = calculator.calc_normalized().unwrap();

    let peak = strongest(&sharp);
    assert!(filtered[peak] < 0.0);
    // a Q cutoff broadens the peak, lowering its height
    assert!(filtered[peak].abs() < sharp[peak].abs());
    assert!(sharp.iter().zip(&filtered).any(|(a, b)| (a - b).abs() > 1e-6));
}

#[test]
fn test_normalized_is_independent_of_moment_size() {
    let small = calculator_for(dimer_structure(-1.0), 15.0).calc_normalized().unwrap();
    let large = calculator_for(
        MagStructure::from_arrays(
            array![[0.0, 0.0, 0.0], [4.0, 0.0, 0.0]],
            array![[0.0, 0.0, 3.0], [0.0, 0.0, -3.0]],
        )
        .unwrap(),
        15.0,
    )
    .calc_normalized()
    .unwrap();
    for (s, l) in small.iter().zip(&large) {
        assert_relative_eq!(*s, *l, epsilon = 1e-12, max_relative = 1e-10);
    }
}
