// tests/ingest_config.rs
use channel_news_sync::ingest::config::load_channels_from;
use channel_news_sync::{ChannelDescriptor, SyncConfig};
use std::path::PathBuf;
use std::{env, fs};

#[test]
fn channel_file_keeps_order_and_formats() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("channels.txt");
    fs::write(
        &p,
        "VahidOnline\r\n\n  IranIntl | 1001 | -9000 \nbbcpersian|77\n|5|6\n",
    )
    .unwrap();

    let v = load_channels_from(&p).unwrap();
    assert_eq!(
        v,
        vec![
            ChannelDescriptor::by_handle("VahidOnline"),
            ChannelDescriptor::by_identity("IranIntl", 1001, -9000),
            ChannelDescriptor::by_handle("bbcpersian"),
        ]
    );
}

#[test]
fn missing_channel_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_channels_from(&dir.path().join("nope.txt")).unwrap_err();
    assert!(format!("{err:#}").contains("reading channel list"));
}

const VARS: [&str; 6] = [
    "NEWS_SYNC_CONFIG",
    "NEWS_SYNC_CHANNELS",
    "NEWS_SYNC_OUTPUT",
    "NEWS_SYNC_MEDIA_DIR",
    "NEWS_SYNC_LIMIT",
    "NEWS_SYNC_MAX_DURATION_SECS",
];

#[serial_test::serial]
#[test]
fn default_config_uses_file_then_env() {
    // keep the repo's own config/ out of the picture
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    for k in VARS {
        env::remove_var(k);
    }

    // 1) nothing → defaults
    assert_eq!(SyncConfig::load_default().unwrap(), SyncConfig::default());

    // 2) ./config/sync.toml
    fs::create_dir_all(tmp.path().join("config")).unwrap();
    fs::write(
        tmp.path().join("config/sync.toml"),
        "output_path = \"public/news.json\"\nlimit = 20\n",
    )
    .unwrap();
    let cfg = SyncConfig::load_default().unwrap();
    assert_eq!(cfg.output_path, PathBuf::from("public/news.json"));
    assert_eq!(cfg.limit, 20);
    assert_eq!(cfg.media_dir(), PathBuf::from("public/media"));

    // 3) env beats file, junk numbers are ignored
    env::set_var("NEWS_SYNC_LIMIT", "5");
    env::set_var("NEWS_SYNC_MAX_DURATION_SECS", "soon");
    env::set_var("NEWS_SYNC_MEDIA_DIR", "/srv/media");
    let cfg = SyncConfig::load_default().unwrap();
    assert_eq!(cfg.limit, 5);
    assert_eq!(cfg.max_duration_secs, 900);
    assert_eq!(cfg.media_dir(), PathBuf::from("/srv/media"));

    // 4) explicit config path must exist
    env::set_var("NEWS_SYNC_CONFIG", tmp.path().join("missing.toml"));
    assert!(SyncConfig::load_default().is_err());

    for k in VARS {
        env::remove_var(k);
    }
    env::set_current_dir(&old).unwrap();
}

#[test]
fn shipped_example_config_parses() {
    let p = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config/sync.example.toml");
    let cfg = SyncConfig::load_from_file(&p).unwrap();
    assert_eq!(cfg.output_path, PathBuf::from("public/news.json"));
    assert_eq!(cfg.media_dir(), PathBuf::from("public/media"));
    assert_eq!(cfg.diagnostics_path(), PathBuf::from("public/debug_errors.txt"));
}
