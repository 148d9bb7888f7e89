use kale_vector_store::{Chunk, EmbeddingModel, VectorCollection, VectorRecord};
use std::sync::Arc;
use tempfile::TempDir;

async fn build(temp: &TempDir, model: &EmbeddingModel, texts: &[&str]) -> VectorCollection {
    let mut collection = VectorCollection::open(temp.path(), "pykale_xml")
        .await
        .expect("open");
    collection.bind_model(model.model_id()).expect("bind");
    let vectors = model.embed_batch(texts).await.expect("embed");
    let records = texts
        .iter()
        .zip(vectors)
        .enumerate()
        .map(|(seq, (text, vector))| {
            VectorRecord::for_chunk(
                seq,
                Chunk::new(text.to_string(), "pykale.xml", seq, 0),
                vector,
            )
        })
        .collect();
    collection.upsert(records).expect("upsert");
    collection.save().await.expect("save");
    collection
}

#[tokio::test]
async fn concurrent_readers_share_one_collection() {
    let temp = TempDir::new().expect("tempdir");
    let model = Arc::new(EmbeddingModel::stub(48));
    let texts = ["load data", "prepare data", "embed", "predict", "evaluate"];
    build(&temp, &model, &texts).await;

    let shared = Arc::new(
        VectorCollection::open(temp.path(), "pykale_xml")
            .await
            .expect("reopen"),
    );
    let mut handles = Vec::new();
    for text in texts {
        let collection = Arc::clone(&shared);
        let model = Arc::clone(&model);
        handles.push(tokio::spawn(async move {
            let query = model.embed(text).await.expect("embed");
            let hits = collection.similarity_search(&query, 1).expect("search");
            (text, hits[0].chunk.text.clone())
        }));
    }

    for handle in handles {
        let (query, best) = handle.await.expect("join");
        assert_eq!(query, best);
    }
}

#[tokio::test]
async fn reopened_collection_refuses_other_model() {
    let temp = TempDir::new().expect("tempdir");
    let model = EmbeddingModel::stub(16);
    build(&temp, &model, &["one", "two"]).await;

    let reopened = VectorCollection::open(temp.path(), "pykale_xml")
        .await
        .expect("reopen");
    assert!(reopened.check_model("stub-16").is_ok());
    assert!(reopened.check_model("text-embedding-ada-002").is_err());
}
