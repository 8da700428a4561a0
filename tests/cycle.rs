mod common;

use common::{Calls, assembler};
use mindful_shorts::config::CompletionConfig;
use mindful_shorts::cycle::CycleRunner;
use mindful_shorts::generator::PhraseGenerator;
use mindful_shorts::phrases::PhraseSet;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::time::Duration;

#[tokio::test]
async fn failed_generation_still_assembles_the_previous_phrases() {
    let dir = tempfile::tempdir().unwrap();
    let phrase_file = dir.path().join("mindfulness.json");
    PhraseSet::new(
        "Respiración consciente",
        vec!["inhala".into(), "sostén".into(), "exhala".into()],
    )
    .save(&phrase_file)
    .unwrap();
    let before = std::fs::read_to_string(&phrase_file).unwrap();

    let cfg = CompletionConfig {
        api_key: "test".into(),
        endpoint: "http://127.0.0.1:9/chat/completions".into(),
        timeout_secs: 2,
        ..CompletionConfig::default()
    };
    let generator = PhraseGenerator::new(cfg, phrase_file.clone(), 3)
        .unwrap()
        .with_rng(StdRng::seed_from_u64(1));

    let calls = Calls::default();
    let videos = dir.path().join("videos");
    std::fs::create_dir_all(&videos).unwrap();
    let mut runner = CycleRunner::new(
        generator,
        assembler(&calls).with_output_dir(&videos),
        Duration::from_secs(300),
    );

    let outcome = runner.run_cycle().await;
    assert!(!outcome.generated);
    assert!(outcome.uploaded_url.is_none());

    let video = outcome.video.expect("assembly should run on the saved phrases");
    assert_eq!(video.parent(), Some(videos.as_path()));
    let name = video.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("video_respiracion_consc"), "{name}");
    assert!(name.ends_with(".mp4"));

    assert_eq!(std::fs::read_to_string(&phrase_file).unwrap(), before);
    assert_eq!(calls.segments().len(), 4);
}
