// Copyright 2025 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.

use cloudspan::{ComputeService, NodeSpec, ProviderConfig};

#[tokio::main]
async fn main() {
    let config = ProviderConfig::openstack()
        .with_option("endpoint", "https://nova.example.com:8774/v2.1")
        .with_option("identity_endpoint", "https://keystone.example.com:5000/v3")
        .with_option("username", "the_username")
        .with_option("password", "the_password")
        .with_option("project", "the_project");
    let service = ComputeService::builder(config).build().await.unwrap();

    // Pick the smallest hardware profile on offer
    let hardware = service.list_hardware().await.unwrap();
    let smallest = hardware
        .iter()
        .min_by_key(|h| (h.cores, h.ram_mb))
        .expect("no hardware profiles");

    let spec = NodeSpec::new("demo-node", "the_image_id", &smallest.id)
        .with_option("key_name", "the_keypair");
    let node = service.create_node_and_wait(&spec).await.unwrap();

    println!("node {} is {}", node.id, node.state);
    for addr in &node.public_addresses {
        println!("  public  {}", addr);
    }
    for addr in &node.private_addresses {
        println!("  private {}", addr);
    }
}
