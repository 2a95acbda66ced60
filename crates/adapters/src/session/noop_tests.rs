use super::*;
use crate::session::SessionAdapter;

#[tokio::test]
async fn reports_absence_everywhere() {
    let adapter = NoOpSessionAdapter::new();
    assert!(!adapter.has_session("any").await.unwrap());
    assert!(adapter.list_sessions().await.unwrap().is_empty());
    assert_eq!(adapter.get_env("any", "GT_ROLE").await.unwrap(), None);
    assert!(!adapter.is_process_running("any", "claude").await.unwrap());
}

#[tokio::test]
async fn accepts_commands_silently() {
    let adapter = NoOpSessionAdapter::new();
    adapter
        .spawn("s", std::path::Path::new("/"), "true", &[])
        .await
        .unwrap();
    adapter.kill("s").await.unwrap();
    adapter.send_enter("s").await.unwrap();
}
