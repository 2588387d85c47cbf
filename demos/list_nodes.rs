// Copyright 2022 Adobe. All rights reserved.
// This file is licensed to you under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License. You may obtain a copy
// of the License at http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software distributed under
// the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR REPRESENTATIONS
// OF ANY KIND, either express or implied. See the License for the specific language
// governing permissions and limitations under the License.

use cloudspan::{ComputeService, ProviderConfig};

#[tokio::main]
async fn main() {
    let config = ProviderConfig::openstack()
        .with_option("endpoint", "https://nova.example.com:8774/v2.1")
        .with_option("identity_endpoint", "https://keystone.example.com:5000/v3")
        .with_option("username", "the_username")
        .with_option("password", "the_password")
        .with_option("project", "the_project");
    let service = ComputeService::builder(config).build().await.unwrap();

    // List every node the project can see
    let nodes = service.list_nodes().await.unwrap();
    for node in &nodes {
        println!("{}  {}  {}", node.id, node.name, node.state);
    }
    println!("{} nodes", nodes.len());
}
