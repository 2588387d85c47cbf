use cloudspan::{ComputeService, NodeSpec, ProviderConfig};
use std::time::Duration;

#[tokio::main]
async fn main() {
    let config = ProviderConfig::stub().with_option("startup_ticks", "2");
    let service = ComputeService::builder(config)
        .with_poll_period(Duration::from_millis(50))
        .build()
        .await
        .unwrap();

    // Create a node and wait until it is running
    let spec = NodeSpec::new("demo-node", "img-debian-12", "hw-small");
    let node = service.create_node_and_wait(&spec).await.unwrap();
    println!("created {} ({})", node.id, node.state);

    // Tear it down and wait until it is gone
    service.destroy_node_and_wait(&node.id).await.unwrap();
    println!("destroyed {}", node.id);
}
