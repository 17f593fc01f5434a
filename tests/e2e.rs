mod common;

use common::synthetic_event::{longitudinal_track, transverse_track};
use track_hough::finder::builder::PatternGrid;
use track_hough::merger::PatternMerger;
use track_hough::pattern::Pattern;
use track_hough::projection::{Projection, ProjectionKind};
use track_hough::{EventHits, FinderParams, PatternFinder};

#[test]
fn clean_transverse_track_gives_one_pattern() {
    // ten collinear transverse hits, zero noise
    let phi = 0.8;
    let mut event = EventHits::new();
    let indices = transverse_track(&mut event, phi, 0.0, 10);

    let finder = PatternFinder::new(FinderParams::default());
    let report = finder.run(&event);

    assert_eq!(
        report.patterns.phi.len(),
        1,
        "expected exactly one transverse pattern"
    );
    let pattern = &report.patterns.phi[0];
    assert_eq!(pattern.hits, indices);

    let found_phi = pattern.direction[1].atan2(pattern.direction[0]);
    assert!(
        (found_phi - phi).abs() < 1e-3,
        "aggregate phi {found_phi} vs generating {phi}"
    );

    // the track was found at level 0
    let xy = report
        .diagnostics
        .projections
        .iter()
        .find(|p| p.projection == "planar-xy")
        .expect("planar-xy diagnostics");
    assert_eq!(xy.levels[0].largest_pattern, 10);
}

#[test]
fn overlapping_transverse_candidates_merge_into_one() {
    // two candidates sharing 9 of 10 hits each
    let mut event = EventHits::new();
    let indices = transverse_track(&mut event, 1.1, 0.0, 11);

    let mut a = Pattern::new(ProjectionKind::PlanarXY);
    for &i in &indices[..10] {
        a.push_hit(i);
    }
    a.refresh_mean_angles(&event);
    let mut b = Pattern::new(ProjectionKind::PlanarXY);
    for &i in &indices[1..] {
        b.push_hit(i);
    }
    b.refresh_mean_angles(&event);
    assert_eq!(a.len(), 10);
    assert_eq!(b.len(), 10);

    let params = FinderParams::default();
    let mut grid = PatternGrid::new(ProjectionKind::PlanarXY, 1, 2);
    grid.set(0, 0, a);
    grid.set(0, 1, b);

    let merger = PatternMerger::new(&event, &params);
    let (merged, diag) = merger.merge_transverse(&grid);

    assert_eq!(merged.len(), 1, "expected a single merged pattern");
    assert_eq!(diag.merged_pairs, 1);
    assert_eq!(merged[0].hits.len(), 11, "union with duplicates removed");
}

#[test]
fn empty_event_produces_empty_report() {
    let finder = PatternFinder::new(FinderParams::default());
    let report = finder.run(&EventHits::new());

    assert!(report.patterns.phi.is_empty());
    assert!(report.patterns.eta.is_empty());
    assert!(report.patterns.curved.is_empty());
    for projection in &report.diagnostics.projections {
        for level in &projection.levels {
            assert_eq!(level.maxima_found, 0);
            assert_eq!(level.patterns_stored, 0);
        }
    }
}

#[test]
fn longitudinal_track_is_found_by_the_curved_projection() {
    let (phi, theta) = (0.4, 1.15);
    let mut event = EventHits::new();
    let indices = longitudinal_track(&mut event, phi, theta, 10);

    let finder = PatternFinder::new(FinderParams::default());
    let report = finder.run(&event);

    assert!(
        !report.patterns.eta.is_empty(),
        "expected a longitudinal pattern"
    );
    assert!(!report.patterns.curved.is_empty());
    let best = report
        .patterns
        .eta
        .iter()
        .max_by_key(|p| p.hits.len())
        .expect("eta pattern");
    assert_eq!(best.hits, indices);

    // direction angle survives the curvature scaling of the output
    let dir = best.direction;
    let found_theta = (dir[0].hypot(dir[1])).atan2(dir[2]);
    assert!(
        (found_theta - theta).abs() < 0.02,
        "aggregate theta {found_theta} vs generating {theta}"
    );
}

#[test]
fn association_is_idempotent() {
    use track_hough::histogram::{BinIndex, Maximum};
    use track_hough::hit::{HitState, PatternId};

    let phi = 0.8;
    let mut event = EventHits::new();
    transverse_track(&mut event, phi, 0.0, 6);

    let params = FinderParams::default();
    let projection = Projection::new(ProjectionKind::PlanarXY, &params);
    let mut state = HitState::new(&event);

    let maximum = Maximum {
        sector: projection.sector(event.get(0)),
        bin: BinIndex { coord: 1, angle: 0 },
        coord: 0.0,
        angle: phi,
        mass: 6.0,
    };

    let first = projection.associate(
        &event,
        &mut state,
        &maximum,
        PatternId { level: 0, slot: 0 },
    );
    assert_eq!(first.len(), 6);

    // without an intervening fill/reset the second pass finds nothing
    let second = projection.associate(
        &event,
        &mut state,
        &maximum,
        PatternId { level: 0, slot: 1 },
    );
    assert!(second.is_empty());
}

#[test]
fn identical_angle_patterns_merge_to_the_same_angle() {
    let theta = 1.3;
    let mut event = EventHits::new();
    let indices = longitudinal_track(&mut event, 0.9, theta, 10);

    let mut a = Pattern::new(ProjectionKind::LongitudinalRZ);
    for &i in &indices[..10] {
        a.push_hit(i);
    }
    let mut b = Pattern::new(ProjectionKind::LongitudinalRZ);
    for &i in &indices[1..] {
        b.push_hit(i);
    }
    for p in [&mut a, &mut b] {
        p.e_phi = 0.9;
        p.e_theta = theta;
        p.inv_curvature = 0.0;
    }
    let b_len = b.len();
    assert_eq!(b_len, 9);

    let params = FinderParams::default();
    let mut grid = PatternGrid::new(ProjectionKind::LongitudinalRZ, 1, 2);
    grid.set(0, 0, a);
    grid.set(0, 1, b);

    let merger = PatternMerger::new(&event, &params);
    let (merged, diag) = merger.merge_longitudinal(&grid);

    // b is a subset of a: subsumption drops it, no merge object is built
    assert_eq!(diag.dropped_subsumed, 1);
    assert_eq!(merged.len(), 1);
    let dir = merged[0].direction;
    let found_theta = (dir[0].hypot(dir[1])).atan2(dir[2]);
    assert!((found_theta - theta).abs() < 1e-9);
}

#[test]
fn size_weighted_circular_merge_preserves_shared_angle() {
    let theta = 2.0;
    let mut event = EventHits::new();
    let indices = longitudinal_track(&mut event, 0.9, theta, 11);

    // sizes 10 and 10 with overlap 9: genuine merge, not subsumption
    let mut a = Pattern::new(ProjectionKind::LongitudinalRZ);
    for &i in &indices[..10] {
        a.push_hit(i);
    }
    let mut b = Pattern::new(ProjectionKind::LongitudinalRZ);
    for &i in &indices[1..] {
        b.push_hit(i);
    }
    for p in [&mut a, &mut b] {
        p.e_phi = 0.9;
        p.e_theta = theta;
        p.inv_curvature = 0.0;
    }

    let params = FinderParams::default();
    let mut grid = PatternGrid::new(ProjectionKind::LongitudinalRZ, 1, 2);
    grid.set(0, 0, a);
    grid.set(0, 1, b);

    let merger = PatternMerger::new(&event, &params);
    let (merged, diag) = merger.merge_longitudinal(&grid);

    assert_eq!(diag.merged_pairs, 1);
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].hits.len(), 11);
    let dir = merged[0].direction;
    let found_theta = (dir[0].hypot(dir[1])).atan2(dir[2]);
    assert!(
        (found_theta - theta).abs() < 1e-9,
        "merged theta {found_theta} vs {theta}"
    );
}

#[test]
fn finder_terminates_on_scattered_events() {
    let mut event = EventHits::new();
    for (i, phi) in [0.2f64, 1.7, 3.1, 4.6].iter().enumerate() {
        transverse_track(&mut event, *phi, 200.0 * i as f64, 4);
        longitudinal_track(&mut event, *phi, 0.6 + 0.5 * i as f64, 4);
    }
    let params = FinderParams::default();
    let max_level = params.max_level;
    let finder = PatternFinder::new(params);
    let report = finder.run(&event);
    for projection in &report.diagnostics.projections {
        assert!(projection.levels.len() <= max_level);
    }
}
