use beacon_server::KeyValueStore;
use serde_json::json;

use crate::integration::init_tracing;
use crate::utils::TestRelay;

#[tokio::test]
async fn test_expired_entry_is_never_redelivered() {
    init_tracing();
    let relay = TestRelay::start("").await;
    relay.post("create", &json!({"room": "r1", "id": "alice"})).await;

    for n in 1..=5 {
        relay
            .post("", &json!({"room": "r1", "message": {"n": n}, "last": 5}))
            .await;
    }
    relay.store.delete("msg:r1:3").await.unwrap();

    let (_, res) = relay.post("", &json!({"room": "r1", "last": 2})).await;
    assert_eq!(res["messages"], json!([{"n": 4}, {"n": 5}]));
    assert_eq!(res["last"], 5);

    let (_, again) = relay.post("", &json!({"room": "r1", "last": 0})).await;
    assert_eq!(again["messages"], json!([{"n": 4}, {"n": 5}]));
}
