use std::fs;
use std::time::Duration;

use tokio::sync::mpsc;
use vast_accountant::{log_path, Accountant, AccountantMessage, MetricValue};

#[tokio::test(start_paused = true)]
async fn hundred_records_without_an_explicit_flush_are_on_disk_within_ten_seconds() {
    let dir = tempfile::tempdir().unwrap();
    let path = log_path(dir.path());
    let accountant = Accountant::open(&path).unwrap();
    let (tx, rx) = mpsc::channel(256);
    let handle = tokio::spawn(accountant.run(rx, tx.clone()));

    for i in 0..100 {
        tx.send(AccountantMessage::Record {
            sender: 1,
            key: "samples".to_string(),
            value: MetricValue::I64(i),
        })
        .await
        .unwrap();
    }

    tokio::time::advance(Duration::from_secs(10)).await;
    tokio::task::yield_now().await;

    drop(tx);
    handle.await.unwrap();

    let contents = fs::read_to_string(&path).unwrap();
    // header + 100 rows
    assert_eq!(contents.lines().count(), 101);
}
