//! Route table emitter

use std::collections::BTreeSet;

use crate::generation::utils::to_public_identifier;
use crate::generation::{Endpoint, Route, RouteTable, Visibility};

/// Split endpoints into public and protected buckets, keeping classifier order
pub fn build_route_table(endpoints: &[Endpoint]) -> RouteTable {
    let mut table = RouteTable::default();
    let mut packages = BTreeSet::new();

    for endpoint in endpoints {
        let route = Route {
            method: endpoint.method,
            path: endpoint.path.clone(),
            package: endpoint.package.clone(),
            handler: to_public_identifier(&endpoint.operation_id),
            paged: endpoint.is_paged(),
        };
        packages.insert(route.package.clone());
        match endpoint.visibility {
            Visibility::Public => table.public.push(route),
            Visibility::Protected => table.protected.push(route),
        }
    }

    table.packages = packages.into_iter().collect();
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{HttpMethod, RequestShape, ResponseShape};

    fn endpoint(path: &str, package: &str, visibility: Visibility, response: ResponseShape) -> Endpoint {
        Endpoint {
            method: HttpMethod::Get,
            path: path.to_string(),
            visibility,
            package: package.to_string(),
            operation_id: format!("get_{package}"),
            custom_handler: false,
            response,
            request: RequestShape::None,
            path_params: Vec::new(),
            query_params: Vec::new(),
            status: 200,
        }
    }

    #[test]
    fn test_buckets_keep_order() {
        let table = build_route_table(&[
            endpoint("/health", "status", Visibility::Public, ResponseShape::None),
            endpoint("/tickets", "ticket", Visibility::Protected, ResponseShape::Paged { item: Some("Ticket".into()) }),
            endpoint("/branches", "branch", Visibility::Protected, ResponseShape::None),
        ]);

        assert_eq!(table.public.len(), 1);
        assert_eq!(table.public[0].handler, "Get_status");
        let protected: Vec<_> = table.protected.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(protected, vec!["/tickets", "/branches"]);
        assert!(table.needs_authorization());
        assert!(table.needs_paging());
        assert_eq!(table.packages, vec!["branch", "status", "ticket"]);
    }

    #[test]
    fn test_public_only_table_needs_no_middleware() {
        let table = build_route_table(&[endpoint("/health", "status", Visibility::Public, ResponseShape::None)]);
        assert!(!table.needs_authorization());
        assert!(!table.needs_paging());
        assert!(build_route_table(&[]).is_empty());
    }
}
