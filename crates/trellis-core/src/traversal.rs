//! Snapshot-based graph traversal algorithms
//!
//! Backends hand a point-in-time snapshot of one workspace's live
//! records to the algorithms here. Working over a plain id map and a
//! flat edge list keeps the BFS code free of live object graphs and
//! lock scopes; concurrent writers can never invalidate a snapshot
//! mid-walk.

use crate::edge::{Edge, EdgeId};
use crate::entity::{Entity, EntityId};
use crate::query::{Direction, NeighborOptions, Path, TraverseOptions};
use std::collections::{HashMap, HashSet, VecDeque};

/// A read snapshot of one workspace's live entities and edges
#[derive(Debug, Clone, Default)]
pub struct GraphSnapshot {
    entities: HashMap<EntityId, Entity>,
    edges: Vec<Edge>,
}

impl GraphSnapshot {
    /// Build a snapshot, keeping only live entities and live edges
    /// whose endpoints are both present.
    pub fn new(entities: Vec<Entity>, edges: Vec<Edge>) -> Self {
        let entities: HashMap<EntityId, Entity> = entities
            .into_iter()
            .filter(|e| !e.is_deleted())
            .map(|e| (e.id, e))
            .collect();
        let edges = edges
            .into_iter()
            .filter(|e| {
                !e.is_deleted()
                    && entities.contains_key(&e.source_id)
                    && entities.contains_key(&e.target_id)
            })
            .collect();
        Self { entities, edges }
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Adjacency lists under the given filters, with each neighbor
    /// list sorted by `(neighbor id, edge id)` so that every walk is
    /// deterministic.
    fn adjacency(
        &self,
        direction: Direction,
        edge_type: Option<&str>,
    ) -> HashMap<EntityId, Vec<(EntityId, EdgeId)>> {
        let mut adjacency: HashMap<EntityId, Vec<(EntityId, EdgeId)>> = HashMap::new();
        for edge in &self.edges {
            if let Some(wanted) = edge_type {
                if edge.edge_type != wanted {
                    continue;
                }
            }
            match direction {
                Direction::Out => {
                    adjacency
                        .entry(edge.source_id)
                        .or_default()
                        .push((edge.target_id, edge.id));
                }
                Direction::In => {
                    adjacency
                        .entry(edge.target_id)
                        .or_default()
                        .push((edge.source_id, edge.id));
                }
                Direction::Both => {
                    adjacency
                        .entry(edge.source_id)
                        .or_default()
                        .push((edge.target_id, edge.id));
                    adjacency
                        .entry(edge.target_id)
                        .or_default()
                        .push((edge.source_id, edge.id));
                }
            }
        }
        for neighbors in adjacency.values_mut() {
            neighbors.sort_unstable();
        }
        adjacency
    }

    /// Distinct entities exactly one matching edge away from `origin`.
    ///
    /// The origin must exist in the snapshot; callers map a missing
    /// origin to a not-found error before reaching here.
    pub fn neighbors(&self, origin: EntityId, options: &NeighborOptions) -> Vec<Entity> {
        let adjacency = self.adjacency(options.direction, options.edge_type.as_deref());
        let mut seen = HashSet::new();
        let mut result = Vec::new();
        for (neighbor, _) in adjacency.get(&origin).map(Vec::as_slice).unwrap_or(&[]) {
            if seen.insert(*neighbor) {
                if let Some(entity) = self.entities.get(neighbor) {
                    result.push(entity.clone());
                }
            }
        }
        tracing::debug!(
            origin = %origin,
            count = result.len(),
            "neighbor lookup"
        );
        result
    }

    /// All shortest undirected paths between `source` and `target`
    /// within `max_depth` hops.
    ///
    /// Breadth-first level expansion: the minimal hop count is fixed
    /// the first time the target appears on a frontier, and deeper
    /// levels are never explored. Returns an empty vec when the target
    /// is unreachable within the bound. Paths come back in
    /// lexicographic node-sequence order.
    pub fn shortest_paths(&self, source: EntityId, target: EntityId, max_depth: u32) -> Vec<Path> {
        if source == target {
            return vec![Path {
                nodes: vec![source],
                edges: vec![],
            }];
        }

        let adjacency = self.adjacency(Direction::Both, None);
        let mut dist: HashMap<EntityId, u32> = HashMap::new();
        let mut parents: HashMap<EntityId, Vec<(EntityId, EdgeId)>> = HashMap::new();
        let mut queue: VecDeque<EntityId> = VecDeque::new();

        dist.insert(source, 0);
        queue.push_back(source);
        let mut found_depth: Option<u32> = None;

        while let Some(current) = queue.pop_front() {
            let depth = dist[&current];
            // Nothing past the target's level can yield a shorter path.
            if let Some(found) = found_depth {
                if depth + 1 > found {
                    break;
                }
            }
            if depth >= max_depth {
                continue;
            }

            for (next, edge_id) in adjacency.get(&current).map(Vec::as_slice).unwrap_or(&[]) {
                match dist.get(next) {
                    None => {
                        dist.insert(*next, depth + 1);
                        parents.entry(*next).or_default().push((current, *edge_id));
                        if *next == target {
                            found_depth = Some(depth + 1);
                        } else {
                            queue.push_back(*next);
                        }
                    }
                    Some(&d) if d == depth + 1 => {
                        parents.entry(*next).or_default().push((current, *edge_id));
                    }
                    Some(_) => {}
                }
            }
        }

        if found_depth.is_none() {
            tracing::debug!(source = %source, target = %target, max_depth, "no path found");
            return Vec::new();
        }

        let mut paths = Vec::new();
        let mut trail: Vec<(EntityId, Option<EdgeId>)> = vec![(target, None)];
        collect_paths(source, &parents, &mut trail, &mut paths);
        paths.sort_by(|a, b| a.nodes.cmp(&b.nodes));

        tracing::debug!(
            source = %source,
            target = %target,
            depth = found_depth,
            count = paths.len(),
            "shortest paths found"
        );
        paths
    }

    /// Entities reachable within `max_depth` hops of `start`,
    /// inclusive of the start entity, deduplicated, truncated at
    /// `limit`.
    ///
    /// Total over any depth: depth 0 yields exactly the start entity.
    pub fn reachable(&self, start: EntityId, options: &TraverseOptions) -> Vec<Entity> {
        let adjacency = self.adjacency(options.direction, options.edge_type.as_deref());
        let mut visited: HashSet<EntityId> = HashSet::new();
        let mut queue: VecDeque<(EntityId, u32)> = VecDeque::new();
        let mut result = Vec::new();

        visited.insert(start);
        if let Some(entity) = self.entities.get(&start) {
            result.push(entity.clone());
        }
        queue.push_back((start, 0));

        while let Some((current, depth)) = queue.pop_front() {
            if result.len() >= options.limit {
                break;
            }
            if depth >= options.max_depth {
                continue;
            }
            for (next, _) in adjacency.get(&current).map(Vec::as_slice).unwrap_or(&[]) {
                if visited.insert(*next) {
                    if let Some(entity) = self.entities.get(next) {
                        result.push(entity.clone());
                        if result.len() >= options.limit {
                            return result;
                        }
                    }
                    queue.push_back((*next, depth + 1));
                }
            }
        }

        tracing::debug!(
            start = %start,
            max_depth = options.max_depth,
            count = result.len(),
            "bounded traversal"
        );
        result
    }
}

/// Walk the multi-parent map from the target back to the source,
/// emitting one path per distinct parent chain.
fn collect_paths(
    source: EntityId,
    parents: &HashMap<EntityId, Vec<(EntityId, EdgeId)>>,
    trail: &mut Vec<(EntityId, Option<EdgeId>)>,
    paths: &mut Vec<Path>,
) {
    let (current, _) = trail[trail.len() - 1];
    if current == source {
        // trail runs target-first; reverse into source-first order.
        // Only the target entry carries no edge, and it lands last
        // after the reversal.
        let nodes: Vec<EntityId> = trail.iter().rev().map(|(node, _)| *node).collect();
        let edges: Vec<EdgeId> = trail.iter().rev().filter_map(|(_, edge)| *edge).collect();
        paths.push(Path { nodes, edges });
        return;
    }
    if let Some(links) = parents.get(&current) {
        for (prev, edge) in links {
            trail.push((*prev, Some(*edge)));
            collect_paths(source, parents, trail, paths);
            trail.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Properties;
    use crate::workspace::WorkspaceId;

    struct Fixture {
        ws: WorkspaceId,
        entities: Vec<Entity>,
        edges: Vec<Edge>,
        by_name: HashMap<&'static str, EntityId>,
    }

    impl Fixture {
        fn new(names: &[&'static str]) -> Self {
            let ws = WorkspaceId::new();
            let mut entities = Vec::new();
            let mut by_name = HashMap::new();
            for name in names {
                let entity = Entity::new(ws, "node", Properties::new());
                by_name.insert(*name, entity.id);
                entities.push(entity);
            }
            Self {
                ws,
                entities,
                edges: Vec::new(),
                by_name,
            }
        }

        fn link(&mut self, from: &str, to: &str, edge_type: &str) -> EdgeId {
            let edge = Edge::new(
                self.ws,
                edge_type,
                self.by_name[from],
                self.by_name[to],
                Properties::new(),
            );
            let id = edge.id;
            self.edges.push(edge);
            id
        }

        fn id(&self, name: &str) -> EntityId {
            self.by_name[name]
        }

        fn snapshot(&self) -> GraphSnapshot {
            GraphSnapshot::new(self.entities.clone(), self.edges.clone())
        }
    }

    #[test]
    fn test_neighbors_dedup_and_filters() {
        let mut fx = Fixture::new(&["a", "b", "c"]);
        fx.link("a", "b", "knows");
        fx.link("b", "a", "knows"); // reverse edge: still one distinct neighbor
        fx.link("a", "c", "employs");

        let snapshot = fx.snapshot();

        let all = snapshot.neighbors(fx.id("a"), &NeighborOptions::default());
        assert_eq!(all.len(), 2);

        let knows = snapshot.neighbors(
            fx.id("a"),
            &NeighborOptions::default().with_edge_type("knows"),
        );
        assert_eq!(knows.len(), 1);
        assert_eq!(knows[0].id, fx.id("b"));

        let outgoing = snapshot.neighbors(
            fx.id("c"),
            &NeighborOptions::default().with_direction(Direction::Out),
        );
        assert!(outgoing.is_empty());

        let incoming = snapshot.neighbors(
            fx.id("c"),
            &NeighborOptions::default().with_direction(Direction::In),
        );
        assert_eq!(incoming.len(), 1);
    }

    #[test]
    fn test_cycle_has_two_shortest_paths() {
        // A-B-C-D-A, paths A..C at depth 2: A-B-C and A-D-C
        let mut fx = Fixture::new(&["a", "b", "c", "d"]);
        fx.link("a", "b", "next");
        fx.link("b", "c", "next");
        fx.link("c", "d", "next");
        fx.link("d", "a", "next");

        let paths = fx.snapshot().shortest_paths(fx.id("a"), fx.id("c"), 2);
        assert_eq!(paths.len(), 2);
        for path in &paths {
            assert_eq!(path.len(), 2);
            assert_eq!(path.nodes.first(), Some(&fx.id("a")));
            assert_eq!(path.nodes.last(), Some(&fx.id("c")));
        }
        let middles: HashSet<EntityId> = paths.iter().map(|p| p.nodes[1]).collect();
        assert_eq!(middles, HashSet::from([fx.id("b"), fx.id("d")]));
    }

    #[test]
    fn test_shortest_path_ignores_longer_routes() {
        // a-b-e plus a direct a-e edge: only the direct hop comes back
        let mut fx = Fixture::new(&["a", "b", "e"]);
        fx.link("a", "b", "next");
        fx.link("b", "e", "next");
        let direct = fx.link("a", "e", "next");

        let paths = fx.snapshot().shortest_paths(fx.id("a"), fx.id("e"), 5);
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].edges, vec![direct]);
    }

    #[test]
    fn test_parallel_edges_give_parallel_paths() {
        let mut fx = Fixture::new(&["a", "b"]);
        let first = fx.link("a", "b", "next");
        let second = fx.link("a", "b", "next");

        let paths = fx.snapshot().shortest_paths(fx.id("a"), fx.id("b"), 3);
        assert_eq!(paths.len(), 2);
        let edges: HashSet<EdgeId> = paths.iter().map(|p| p.edges[0]).collect();
        assert_eq!(edges, HashSet::from([first, second]));
    }

    #[test]
    fn test_path_edges_follow_either_direction() {
        // a -> b <- c: undirected reachability still connects a and c
        let mut fx = Fixture::new(&["a", "b", "c"]);
        let ab = fx.link("a", "b", "next");
        let cb = fx.link("c", "b", "next");

        let paths = fx.snapshot().shortest_paths(fx.id("a"), fx.id("c"), 5);
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].nodes, vec![fx.id("a"), fx.id("b"), fx.id("c")]);
        assert_eq!(paths[0].edges, vec![ab, cb]);
    }

    #[test]
    fn test_no_path_within_depth_is_empty() {
        let mut fx = Fixture::new(&["a", "b", "c", "d"]);
        fx.link("a", "b", "next");
        fx.link("b", "c", "next");
        fx.link("c", "d", "next");

        assert!(fx.snapshot().shortest_paths(fx.id("a"), fx.id("d"), 2).is_empty());
        assert_eq!(fx.snapshot().shortest_paths(fx.id("a"), fx.id("d"), 3).len(), 1);
    }

    #[test]
    fn test_source_equals_target() {
        let fx = Fixture::new(&["a"]);
        let paths = fx.snapshot().shortest_paths(fx.id("a"), fx.id("a"), 5);
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].nodes, vec![fx.id("a")]);
        assert!(paths[0].edges.is_empty());
    }

    #[test]
    fn test_reachable_depth_zero_is_start_only() {
        let mut fx = Fixture::new(&["a", "b"]);
        fx.link("a", "b", "next");

        let found = fx
            .snapshot()
            .reachable(fx.id("a"), &TraverseOptions::default().with_depth(0));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, fx.id("a"));
    }

    #[test]
    fn test_reachable_multi_hop_includes_start() {
        let mut fx = Fixture::new(&["a", "b", "c", "d"]);
        fx.link("a", "b", "next");
        fx.link("b", "c", "next");
        fx.link("c", "d", "next");

        let found = fx
            .snapshot()
            .reachable(fx.id("a"), &TraverseOptions::default().with_depth(2));
        let ids: HashSet<EntityId> = found.iter().map(|e| e.id).collect();
        assert_eq!(ids, HashSet::from([fx.id("a"), fx.id("b"), fx.id("c")]));
    }

    #[test]
    fn test_reachable_truncates_at_limit() {
        let mut fx = Fixture::new(&["a", "b", "c", "d", "e"]);
        for to in ["b", "c", "d", "e"] {
            fx.link("a", to, "next");
        }

        let found = fx.snapshot().reachable(
            fx.id("a"),
            &TraverseOptions::default().with_depth(1).with_limit(3),
        );
        assert_eq!(found.len(), 3);
        assert_eq!(found[0].id, fx.id("a"));
    }

    #[test]
    fn test_reachable_respects_direction_and_edge_type() {
        let mut fx = Fixture::new(&["a", "b", "c"]);
        fx.link("a", "b", "owns");
        fx.link("c", "a", "owns");
        fx.link("a", "c", "likes");

        let out_owns = fx.snapshot().reachable(
            fx.id("a"),
            &TraverseOptions::default()
                .with_depth(2)
                .with_direction(Direction::Out)
                .with_edge_type("owns"),
        );
        let ids: HashSet<EntityId> = out_owns.iter().map(|e| e.id).collect();
        assert_eq!(ids, HashSet::from([fx.id("a"), fx.id("b")]));
    }

    #[test]
    fn test_snapshot_drops_tombstones_and_dangling_edges() {
        let mut fx = Fixture::new(&["a", "b", "c"]);
        fx.link("a", "b", "next");
        fx.link("b", "c", "next");
        // Tombstone b: both edges now dangle and must vanish.
        fx.entities[1].tombstone();

        let snapshot = fx.snapshot();
        assert!(!snapshot.contains(fx.id("b")));
        let found = snapshot.reachable(fx.id("a"), &TraverseOptions::default());
        assert_eq!(found.len(), 1);
    }
}
