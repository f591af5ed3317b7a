// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use approx::assert_relative_eq;
use plankit_geometry::bool2d::overlap_area;
use plankit_geometry::Polygon2;
use plankit_room::{
    extract_rooms, Content, ContentInput, ExtractorConfig, ExtractorPhase, FloorInput, Opening,
    OpeningInput, OpeningKind, PartitionInput, Point2D, RoomExtractor, Strategy, WallInput,
};

fn rect(w: f64, h: f64) -> Vec<Point2D> {
    vec![
        Point2D::new(0.0, 0.0),
        Point2D::new(w, 0.0),
        Point2D::new(w, h),
        Point2D::new(0.0, h),
    ]
}

/// 4 x 5 floor with one door on the south edge.
fn small_floor() -> FloorInput {
    FloorInput::from_points("floor", &rect(4.0, 5.0)).with_opening(
        OpeningInput::new("door-1", OpeningKind::Door, Point2D::new(2.0, 0.0), 0.9).with_depth(0.12),
    )
}

#[test]
fn test_single_room_under_skeleton_and_divide_space() {
    for strategy in [Strategy::Skeleton, Strategy::DivideSpace] {
        let mut extractor = RoomExtractor::new(ExtractorConfig::default());
        extractor.supply(small_floor());
        let rooms = extractor.extract(strategy);

        assert_eq!(rooms.len(), 1, "{}", strategy);
        assert_relative_eq!(rooms[0].area, 20.0, epsilon = 1e-6);
        assert_eq!(rooms[0].door_count(), 1);
        assert_eq!(rooms[0].strategy, strategy);
        assert_eq!(extractor.phase(), ExtractorPhase::Done);

        let host = rooms[0].openings[0].host.as_ref().unwrap();
        assert_relative_eq!(host.pos_param.center, 0.5, epsilon = 1e-6);
        assert_eq!(rooms[0].host_summary.count, 1);
        assert!(rooms[0].host_summary.doors_bottom_profiles_wkt.starts_with("MULTIPOLYGON"));
        assert_eq!(rooms[0].host_summary.windows_bottom_profiles_wkt, "MULTIPOLYGON EMPTY");
        // one door clearance
        assert_eq!(rooms[0].cut_polygons.len(), 1);
    }
}

#[test]
fn test_whole_floor_keeps_curve_count() {
    let rooms = extract_rooms(small_floor(), Strategy::Default, &ExtractorConfig::default());
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0].num_of_outer_curves, 4);
    assert_eq!(rooms[0].loops.len(), 1);
    assert!(rooms[0].wkt.starts_with("POLYGON((0 0,4 0,4 5,0 5,0 0))"));
}

#[test]
fn test_divide_space_by_interior_wall() {
    let floor = small_floor()
        .with_wall(WallInput::straight(Point2D::new(2.0, -0.5), Point2D::new(2.0, 5.5), 0.12))
        .with_content(ContentInput::new("sofa", Point2D::new(3.0, 3.0), 1.0, 0.8));
    let rooms = extract_rooms(floor, Strategy::DivideSpace, &ExtractorConfig::default());

    assert_eq!(rooms.len(), 2);
    for room in &rooms {
        assert_relative_eq!(room.area, 9.7, epsilon = 1e-6);
    }
    let with_sofa: Vec<_> = rooms.iter().filter(|r| !r.contents.is_empty()).collect();
    assert_eq!(with_sofa.len(), 1);
    assert_eq!(with_sofa[0].contents[0].id, "sofa");
    // The door sits on the wall line and goes to exactly one room.
    let doors: usize = rooms.iter().map(|r| r.door_count()).sum();
    assert_eq!(doors, 1);
}

#[test]
fn test_skeleton_splits_l_floor() {
    let floor = FloorInput::from_points(
        "l",
        &[
            Point2D::new(0.0, 0.0),
            Point2D::new(6.0, 0.0),
            Point2D::new(6.0, 2.0),
            Point2D::new(2.0, 2.0),
            Point2D::new(2.0, 6.0),
            Point2D::new(0.0, 6.0),
        ],
    );
    let rooms = extract_rooms(floor.clone(), Strategy::Skeleton, &ExtractorConfig::default());
    assert_eq!(rooms.len(), 2);
    let total: f64 = rooms.iter().map(|r| r.area).sum();
    assert_relative_eq!(total, 20.0, epsilon = 1e-6);

    let whole = extract_rooms(floor, Strategy::Default, &ExtractorConfig::default());
    assert_eq!(whole.len(), 1);
}

#[test]
fn test_many_cuts_by_partition() {
    let floor = FloorInput::from_points("open-plan", &rect(4.0, 5.0))
        .with_partition(PartitionInput::new(Point2D::new(0.0, 2.5), Point2D::new(4.0, 2.5)));
    let rooms = extract_rooms(floor, Strategy::Many, &ExtractorConfig::default());
    assert_eq!(rooms.len(), 2);
    for room in &rooms {
        assert_relative_eq!(room.area, 10.0, epsilon = 1e-2);
        assert_eq!(room.strategy, Strategy::Many);
    }
}

#[test]
fn test_cuts_and_regions_do_not_overlap() {
    let extractor = RoomExtractor::new(ExtractorConfig::default());
    let polygon = Polygon2::rectangle(
        nalgebra::Point2::new(0.0, 0.0),
        nalgebra::Point2::new(4.0, 5.0),
    );
    let openings = vec![
        Opening::new(
            &OpeningInput::new("d1", OpeningKind::Door, Point2D::new(1.0, 0.0), 0.9),
            0.12,
        ),
        Opening::new(
            &OpeningInput::new("d2", OpeningKind::Door, Point2D::new(0.0, 1.0), 0.9),
            0.12,
        ),
        Opening::new(
            &OpeningInput::new("w1", OpeningKind::Window, Point2D::new(4.0, 3.0), 1.5),
            0.12,
        ),
    ];
    let contents = vec![
        Content::new(&ContentInput::new("bed", Point2D::new(1.2, 1.2), 2.0, 1.6)),
        Content::new(&ContentInput::new("desk", Point2D::new(3.2, 4.3), 1.2, 0.6)),
    ];
    let cuts = extractor.extract_polygon_cuts(&polygon, &openings, &contents);

    assert!(cuts.cut_polygons.len() >= 3);
    let all: Vec<&Polygon2> = cuts.cut_polygons.iter().chain(&cuts.region_polygons).collect();
    for (i, a) in all.iter().enumerate() {
        for b in &all[i + 1..] {
            assert!(overlap_area(a, b) < 1e-6);
        }
    }
    let total: f64 = all.iter().map(|p| p.area()).sum();
    assert_relative_eq!(total, 20.0, epsilon = 1e-4);
    assert_eq!(cuts.features.len(), 1);
    assert_eq!(cuts.features[0].opening_id, "w1");
}

#[test]
fn test_glazed_facade_index() {
    let extractor = RoomExtractor::new(ExtractorConfig::default());
    let glazed = FloorInput::from_points("f", &rect(4.0, 5.0))
        .with_opening(OpeningInput::new("w1", OpeningKind::Window, Point2D::new(1.0, 5.0), 1.2))
        .with_opening(OpeningInput::new("w2", OpeningKind::Window, Point2D::new(3.0, 5.0), 1.2));
    assert_eq!(extractor.get_glazed_facade_index(&glazed), Some(2));

    let plain = small_floor();
    assert_eq!(extractor.get_glazed_facade_index(&plain), None);

    let rooms = extract_rooms(glazed, Strategy::Default, &ExtractorConfig::default());
    let json = serde_json::to_value(&rooms[0]).unwrap();
    assert_eq!(json["glazedFacadeIndex"], 2);
    let rooms = extract_rooms(plain, Strategy::Default, &ExtractorConfig::default());
    let json = serde_json::to_value(&rooms[0]).unwrap();
    assert_eq!(json["glazedFacadeIndex"], -1);
}

#[test]
fn test_small_cells_are_dropped() {
    let config = ExtractorConfig {
        min_room_area: 20.0,
        ..Default::default()
    };
    let mut extractor = RoomExtractor::new(config);
    extractor.supply(FloorInput::from_points("big", &rect(6.0, 5.0)).with_partition(
        PartitionInput::new(Point2D::new(1.0, -0.1), Point2D::new(1.0, 5.1)),
    ));
    let rooms = extractor.extract_room_many();
    assert_eq!(rooms.len(), 1);
    assert!(rooms[0].area > 24.0);
}

#[tokio::test]
async fn test_async_matches_sync() {
    let mut extractor = RoomExtractor::new(ExtractorConfig::default());
    extractor.supply(small_floor());
    let rooms = extractor.extract_async(Strategy::MultiSkeleton).await;
    assert_eq!(rooms.len(), 1);
    assert_eq!(extractor.phase(), ExtractorPhase::Done);

    let sync = extract_rooms(small_floor(), Strategy::MultiSkeleton, &ExtractorConfig::default());
    assert_eq!(rooms, sync);
}
