//! Route tables become delegated HTTPRoutes.

use tracing::debug;

use crate::context::Context;
use crate::identity::SourceKind;
use crate::target::{HttpRouteSpec, Object};

use super::identity_of;
use super::route::{translate_route, ROUTE_WEIGHT_LABEL};

/// Builds every route table first so that delegation between tables is
/// known before unreferenced tables are reported.
pub fn translate_route_tables(ctx: &mut Context<'_>) {
    let source = ctx.source;
    for table in source.route_tables() {
        let identity = identity_of(SourceKind::RouteTable, table);
        let namespace = table.namespace();

        let rules = table
            .spec
            .routes
            .iter()
            .enumerate()
            .map(|(index, route)| translate_route(ctx, &identity, namespace, index, route))
            .collect();
        let mut route = Object::new(
            namespace,
            table.name(),
            HttpRouteSpec {
                rules,
                ..HttpRouteSpec::default()
            },
        );
        route.metadata.labels = table.metadata.labels.clone();
        if let Some(weight) = table.spec.weight {
            route.metadata.labels.insert(ROUTE_WEIGHT_LABEL.to_string(), weight.to_string());
            ctx.update_required(
                &identity,
                format!("route table weight {weight} is carried as label {ROUTE_WEIGHT_LABEL}, parent routes must enable weighted delegation"),
            );
        }
        debug!(route_table = %identity, "delegated route built");
        ctx.upsert_from(&identity, route);
    }

    for table in source.route_tables() {
        let identity = identity_of(SourceKind::RouteTable, table);
        if !ctx.is_attached(&identity) {
            ctx.no_references(&identity, "route table is not delegated to by any route");
        }
    }
}
