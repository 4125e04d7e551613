//! Cluster grouping for the scatter view.
//!
//! The backend assigns every (store, category) sales aggregate to a k-means
//! cluster. For display we group the points per store (one scatter series each)
//! and compute each cluster's sales span (one shaded band each). Grouping never
//! drops or duplicates a point.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::{CategoryCode, ClusterPoint, StoreCode};

/// One scatter point: x = sales, y = category code.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub sales: f64,
    pub category: CategoryCode,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreGroup {
    pub store: StoreCode,
    pub points: Vec<ScatterPoint>,
}

/// Sales span covered by one cluster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClusterBounds {
    pub cluster: i64,
    pub min_sales: f64,
    pub max_sales: f64,
    pub count: usize,
}

/// Group points by store code, in order of each store's first appearance.
pub fn group_by_store(points: &[ClusterPoint]) -> Vec<StoreGroup> {
    let mut groups: Vec<StoreGroup> = Vec::new();
    for p in points {
        let point = ScatterPoint {
            sales: p.sales,
            category: p.category,
        };
        match groups.iter_mut().find(|g| g.store == p.store) {
            Some(group) => group.points.push(point),
            None => groups.push(StoreGroup {
                store: p.store,
                points: vec![point],
            }),
        }
    }
    groups
}

/// Min/max sales per cluster id, ascending by id.
pub fn cluster_bounds(points: &[ClusterPoint]) -> Vec<ClusterBounds> {
    let mut by_cluster: BTreeMap<i64, ClusterBounds> = BTreeMap::new();
    for p in points {
        by_cluster
            .entry(p.cluster)
            .and_modify(|b| {
                b.min_sales = b.min_sales.min(p.sales);
                b.max_sales = b.max_sales.max(p.sales);
                b.count += 1;
            })
            .or_insert(ClusterBounds {
                cluster: p.cluster,
                min_sales: p.sales,
                max_sales: p.sales,
                count: 1,
            });
    }
    by_cluster.into_values().collect()
}
