// Integration tests for the read -> expand -> write pipeline and the batch worker

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::event::BatchMsg;
    use crate::model::SmoothingSet;
    use crate::pipeline::dmi_io::{read_dmi, write_dmi};
    use crate::pipeline::expansion::{DIRECTIONAL_ROTATIONS, rotate_tile};
    use crate::pipeline::grammar;
    use crate::pipeline::grid::{crop_tile, frame_to_rect, paste_tile};
    use crate::pipeline::{DmiFile, FixOptions, fix_dmi_bytes, fix_dmi_file};
    use crate::pipeline_worker::BatchWorker;
    use crossbeam_channel::unbounded;
    use image::{Rgba, RgbaImage};
    use std::path::Path;
    use tempfile::tempdir;

    const ICON: u32 = 4;

    /// A 4x4 tile with a marker pixel in the top-left corner so rotations
    /// are observable.
    fn marked_tile(value: u8) -> RgbaImage {
        let mut tile = RgbaImage::from_pixel(ICON, ICON, Rgba([value, value, value, 255]));
        tile.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        tile
    }

    fn build_sheet(frames: usize) -> RgbaImage {
        let side = crate::pipeline::frame_index::grid_side_for(frames);
        let mut image = RgbaImage::new(side as u32 * ICON, side as u32 * ICON);
        for index in 0..frames {
            paste_tile(
                &mut image,
                &marked_tile(index as u8 + 1),
                frame_to_rect(index, side, ICON, ICON),
            );
        }
        image
    }

    fn two_state_description() -> String {
        format!(
            "# BEGIN DMI\nversion = 4.0\n\twidth = {ICON}\n\theight = {ICON}\n\
state = \"a\"\n\tdirs = 1\n\tframes = 1\n\
state = \"b\"\n\tdirs = 1\n\tframes = 1\n# END DMI"
        )
    }

    fn write_sample(path: &Path) {
        write_dmi(path, &build_sheet(2), &two_state_description()).unwrap();
    }

    #[test]
    fn test_fix_file_end_to_end() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in").join("walls.dmi");
        let output = dir.path().join("out").join("walls.dmi");
        write_sample(&input);

        let options = FixOptions::new().with_smoothing(SmoothingSet::from_names(["a"]));
        let report = fix_dmi_file(&input, &output, &options).unwrap();

        // T = 2, E = 1 -> 5 slots on a 3x3 grid
        assert_eq!(report.original_total, 2);
        assert_eq!(report.eligible_total, 1);
        assert_eq!(report.new_total, 5);
        assert_eq!(report.new_grid_side, 3);

        let (image, description) = read_dmi(&output).unwrap();
        assert_eq!(image.dimensions(), (3 * ICON, 3 * ICON));

        let descriptor = grammar::parse(&description).unwrap();
        assert_eq!(descriptor.states[0].name, "a");
        assert_eq!(descriptor.states[0].dirs, 4);
        assert_eq!(descriptor.states[1].name, "b");
        assert_eq!(descriptor.states[1].dirs, 1);

        // Slots 0..4 hold the four rotations of "a" in 0/180/90/270 order
        let source = marked_tile(1);
        for (slot, rotation) in DIRECTIONAL_ROTATIONS.iter().enumerate() {
            let cell = crop_tile(&image, frame_to_rect(slot, 3, ICON, ICON));
            assert_eq!(cell, rotate_tile(&source, *rotation), "slot {}", slot);
        }

        // "b" follows at slot 4, untouched
        let b = crop_tile(&image, frame_to_rect(4, 3, ICON, ICON));
        assert_eq!(b, marked_tile(2));

        // Slack slots stay transparent
        let slack = crop_tile(&image, frame_to_rect(8, 3, ICON, ICON));
        assert!(slack.pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn test_fix_bytes_matches_file_pipeline() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("walls.dmi");
        let output = dir.path().join("fixed.dmi");
        write_sample(&input);

        let options = FixOptions::default();
        fix_dmi_file(&input, &output, &options).unwrap();

        let (bytes, _) = fix_dmi_bytes(&std::fs::read(&input).unwrap(), &options).unwrap();
        let from_bytes = DmiFile::from_bytes(&bytes).unwrap();
        let from_file = DmiFile::open(&output).unwrap();

        assert_eq!(from_bytes.grid_side, from_file.grid_side);
        assert_eq!(
            from_bytes.descriptor.states.len(),
            from_file.descriptor.states.len()
        );
    }

    #[test]
    fn test_non_eligible_states_keep_tiles_and_order() {
        let description = format!(
            "version = 4.0\n\twidth = {ICON}\n\theight = {ICON}\n\
state = \"door\"\n\tdirs = 4\n\tframes = 2\n\tdelay = 1,2\n\
state = \"1-f\"\n\tdirs = 1\n\tframes = 2\n"
        );
        let sheet = build_sheet(10);

        let dmi = DmiFile::from_image(&sheet, &description).unwrap();
        let before: Vec<RgbaImage> = dmi.descriptor.states[0].pixel_tiles.clone();
        let rendered = dmi.render(&SmoothingSet::default(), false).unwrap();

        // 8 + 2 * 4 = 16 slots on a 4x4 grid; door keeps slots 0..8
        assert_eq!(rendered.report.new_total, 16);
        for (slot, tile) in before.iter().enumerate() {
            let cell = crop_tile(&rendered.image, frame_to_rect(slot, 4, ICON, ICON));
            assert_eq!(&cell, tile);
        }

        let reparsed = grammar::parse(&rendered.description).unwrap();
        assert_eq!(reparsed.states[0].dirs, 4);
        assert_eq!(reparsed.states[0].frames, 2);
        assert_eq!(reparsed.states[1].dirs, 4);
        assert_eq!(reparsed.states[1].frames, 2);
        assert_eq!(reparsed.total_frames(), 16);
    }

    #[test]
    fn test_missing_description_fails_file() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("plain.dmi");
        let mut bytes = Vec::new();
        build_sheet(1)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        std::fs::write(&input, bytes).unwrap();

        let result = fix_dmi_file(&input, &dir.path().join("out.dmi"), &FixOptions::default());
        assert!(matches!(result, Err(crate::DmiError::MissingDescription)));
    }

    fn batch_fixture(root: &Path) -> Config {
        let input_dir = root.join("in");
        std::fs::create_dir_all(&input_dir).unwrap();

        write_sample(&input_dir.join("good.dmi"));
        write_dmi(
            &input_dir.join("broken.dmi"),
            &build_sheet(1),
            "version = 4.0\n\twidth = 4\n\theight = 4\nstate = \"x\"\n\tframes = 1\n",
        )
        .unwrap();
        std::fs::write(input_dir.join("readme.txt"), "not an icon").unwrap();

        Config {
            input_dir,
            output_dir: root.join("out"),
            ..Config::default()
        }
    }

    #[test]
    fn test_batch_continues_past_failures() {
        let dir = tempdir().unwrap();
        let config = batch_fixture(dir.path());
        let (tx, rx) = unbounded();

        let summary = BatchWorker::run_batch(&config, &tx).unwrap();
        drop(tx);

        assert_eq!(summary.total, 2);
        assert_eq!(summary.fixed, 1);
        assert_eq!(summary.failed, 1);

        assert!(config.output_dir.join("good.dmi").exists());
        assert!(!config.output_dir.join("broken.dmi").exists());
        assert!(!config.output_dir.join("readme.txt").exists());

        let messages: Vec<BatchMsg> = rx.iter().collect();
        assert!(messages.iter().any(|m| matches!(
            m,
            BatchMsg::FileFailed { name, .. } if name == "broken.dmi"
        )));
        assert!(messages.iter().any(|m| matches!(
            m,
            BatchMsg::FileFixed { name, .. } if name == "good.dmi"
        )));
        assert!(matches!(
            messages.last(),
            Some(BatchMsg::Completed { fixed: 1, failed: 1 })
        ));
    }

    #[test]
    fn test_parallel_batch_matches_sequential() {
        let dir = tempdir().unwrap();
        let sequential = batch_fixture(dir.path());
        for name in ["corner.dmi", "door.dmi", "window.dmi"] {
            write_sample(&sequential.input_dir.join(name));
        }
        let parallel = Config {
            output_dir: dir.path().join("out-parallel"),
            thread_count: 0,
            ..sequential.clone()
        };

        let (tx, _rx) = unbounded();
        let first = BatchWorker::run_batch(&sequential, &tx).unwrap();
        let second = BatchWorker::run_batch(&parallel, &tx).unwrap();
        assert_eq!(first, second);
        assert_eq!(second.fixed, 4);
        assert_eq!(second.failed, 1);

        for name in ["good.dmi", "corner.dmi", "door.dmi", "window.dmi"] {
            let a = std::fs::read(sequential.output_dir.join(name)).unwrap();
            let b = std::fs::read(parallel.output_dir.join(name)).unwrap();
            assert_eq!(a, b, "{}", name);

            let (_, description) = read_dmi(&parallel.output_dir.join(name)).unwrap();
            let (_, expected) = read_dmi(&sequential.output_dir.join(name)).unwrap();
            assert_eq!(description, expected, "{}", name);
        }
    }

    #[test]
    fn test_oversized_icon_fails_only_its_file() {
        let dir = tempdir().unwrap();
        let config = batch_fixture(dir.path());
        write_dmi(
            &config.input_dir.join("huge.dmi"),
            &build_sheet(1),
            "version = 4.0\n\twidth = 4294967295\n\theight = 4294967295\n\
state = \"a\"\n\tdirs = 1\n\tframes = 1\n",
        )
        .unwrap();

        let (tx, rx) = unbounded();
        let summary = BatchWorker::run_batch(&config, &tx).unwrap();
        drop(tx);

        assert_eq!(summary.total, 3);
        assert_eq!(summary.fixed, 1);
        assert_eq!(summary.failed, 2);
        assert!(config.output_dir.join("good.dmi").exists());
        assert!(!config.output_dir.join("huge.dmi").exists());

        let messages: Vec<BatchMsg> = rx.iter().collect();
        assert!(messages.iter().any(|m| matches!(
            m,
            BatchMsg::FileFailed { name, .. } if name == "huge.dmi"
        )));
    }

    #[test]
    fn test_batch_with_empty_input() {
        let dir = tempdir().unwrap();
        let config = Config {
            input_dir: dir.path().to_path_buf(),
            output_dir: dir.path().join("out"),
            ..Config::default()
        };
        let (tx, rx) = unbounded();

        let handle = BatchWorker::new(tx).start(config);
        let summary = handle.join().unwrap().unwrap();
        assert_eq!(summary.total, 0);

        let messages: Vec<BatchMsg> = rx.iter().collect();
        assert!(matches!(messages.as_slice(), [BatchMsg::NoInput(_)]));
    }

    #[test]
    fn test_batch_with_missing_input_dir() {
        let dir = tempdir().unwrap();
        let config = Config {
            input_dir: dir.path().join("does-not-exist"),
            ..Config::default()
        };
        let (tx, _rx) = unbounded();
        assert!(BatchWorker::run_batch(&config, &tx).is_err());
    }
}
