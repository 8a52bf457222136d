use super::*;

fn names(groups: &[MediaGroup]) -> Vec<(&str, Vec<&str>)> {
    groups
        .iter()
        .map(|g| (g.key.as_str(), g.files.iter().map(String::as_str).collect()))
        .collect()
}

#[test]
fn groups_carousel_children_by_parent() {
    let files = ["17900_3.jpg", "17900_1.jpg", "17900_2.jpg", "18000.mp4"];
    let groups = group_media(&files, &ChildOrder::new());

    assert_eq!(
        names(&groups),
        vec![
            ("17900", vec!["17900_1.jpg", "17900_2.jpg", "17900_3.jpg"]),
            ("18000", vec!["18000.mp4"]),
        ]
    );
    assert!(groups[0].needs_merge());
    assert!(!groups[1].needs_merge());
    assert_eq!(groups[1].kind, MediaKind::Video);
}

#[test]
fn api_child_order_wins_over_numeric_index() {
    let mut order = ChildOrder::new();
    order.insert("500", vec!["9".into(), "3".into()]);
    let files = ["500_3.jpg", "500_7.png", "500_9.jpg"];
    let groups = group_media(&files, &order);

    assert_eq!(groups[0].files, ["500_9.jpg", "500_3.jpg", "500_7.png"]);
}

#[test]
fn videos_are_never_merged() {
    let files = ["600_1.mp4", "600_2.mp4"];
    let groups = group_media(&files, &ChildOrder::new());

    assert_eq!(groups.len(), 2);
    assert!(groups.iter().all(|g| !g.needs_merge()));
    assert_eq!(groups[0].key, "600_1");
}

#[test]
fn singleton_media_id_prefers_long_digit_run() {
    let files = ["post_1790012345_cover.jpg", "plain.png"];
    let groups = group_media(&files, &ChildOrder::new());

    let by_key: std::collections::HashMap<_, _> =
        groups.iter().map(|g| (g.key.as_str(), g.media_id.as_str())).collect();
    assert_eq!(by_key["post_1790012345_cover"], "1790012345");
    assert_eq!(by_key["plain"], "plain");
}

#[test]
fn carousel_video_child_keeps_parent_id() {
    let groups = group_media(&["17900123_17900456.mp4"], &ChildOrder::new());
    assert_eq!(groups[0].key, "17900123_17900456");
    assert_eq!(groups[0].media_id, "17900123");
}

#[test]
fn ignores_hidden_and_unsupported_files() {
    let files = [".DS_Store", "notes.txt", "17900.pdf", "17900_1.jpg"];
    let groups = group_media(&files, &ChildOrder::new());

    assert_eq!(names(&groups), vec![("17900", vec!["17900_1.jpg"])]);
}

#[test]
fn grouping_is_idempotent() {
    let files = vec![
        "200_2.jpg".to_owned(),
        "200_1.jpg".to_owned(),
        "100.mp4".to_owned(),
        "300.jpg".to_owned(),
    ];
    let first = group_media(&files, &ChildOrder::new());

    let mut regrouped_input: Vec<String> = first.iter().flat_map(|g| g.files.clone()).collect();
    regrouped_input.push("200.pdf".to_owned());
    regrouped_input.reverse();
    let second = group_media(&regrouped_input, &ChildOrder::new());

    assert_eq!(first, second);
}

#[test]
fn singletons_sharing_a_stem_are_all_kept() {
    let forward = group_media(&["123456.jpg", "123456.mp4", "777.png"], &ChildOrder::new());
    let reversed = group_media(&["777.png", "123456.mp4", "123456.jpg"], &ChildOrder::new());

    assert_eq!(
        names(&forward),
        vec![
            ("123456.jpg", vec!["123456.jpg"]),
            ("123456.mp4", vec!["123456.mp4"]),
            ("777", vec!["777.png"]),
        ]
    );
    assert_eq!(forward, reversed);
    assert!(forward[..2].iter().all(|g| g.media_id == "123456"));
}

#[test]
fn same_stem_images_with_different_extensions_stay_separate() {
    let groups = group_media(&["98765.png", "98765.jpg"], &ChildOrder::new());
    assert_eq!(
        names(&groups),
        vec![
            ("98765.jpg", vec!["98765.jpg"]),
            ("98765.png", vec!["98765.png"]),
        ]
    );
    assert!(groups.iter().all(|g| !g.needs_merge()));
}
