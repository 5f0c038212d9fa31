//! Handler emitter
//!
//! Plans the request-handling logic of every generated endpoint and groups
//! the plans per package.

use std::collections::{BTreeMap, BTreeSet};

use crate::generation::params::extraction_steps;
use crate::generation::utils::to_public_identifier;
use crate::generation::{
    BodyDecode, CallArgument, Endpoint, HandlerPackage, HandlerPlan, RequestShape, ResponseShape,
    ResponseWrite,
};

/// Plans grouped per package plus the packages the dependency container must build
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerOutput {
    pub packages: Vec<HandlerPackage>,
    pub needs_construction: BTreeSet<String>,
}

/// Plan one endpoint's handler
pub fn plan_handler(endpoint: &Endpoint) -> HandlerPlan {
    let label = endpoint.label();
    let extractions = extraction_steps(&label, &endpoint.path_params, &endpoint.query_params);

    let body = match &endpoint.request {
        RequestShape::None => None,
        RequestShape::SingleRef(name) => Some(BodyDecode::Record(name.clone())),
        RequestShape::ArrayOfRef(name) => Some(BodyDecode::RecordList(name.clone())),
        RequestShape::PrimitiveOrArray(ty) => Some(BodyDecode::Value(ty.clone())),
    };

    let mut arguments = vec![CallArgument::Context];
    if body.is_some() {
        arguments.push(CallArgument::Body);
    }
    arguments.extend(
        extractions
            .iter()
            .map(|step| CallArgument::Param(step.param.ident.clone())),
    );
    if endpoint.is_paged() {
        arguments.extend([CallArgument::Page, CallArgument::Size, CallArgument::Sort]);
    }

    let status = endpoint.status;
    let response = match endpoint.response {
        ResponseShape::Paged { .. } => ResponseWrite::Page { status },
        ResponseShape::None => ResponseWrite::Status { status },
        _ => ResponseWrite::Json { status },
    };

    HandlerPlan {
        method_name: to_public_identifier(&endpoint.operation_id),
        operation_id: endpoint.operation_id.clone(),
        route: label,
        extractions,
        body,
        arguments,
        response,
    }
}

/// Plan every non-custom endpoint and collect the packages needing construction
pub fn emit_handlers(endpoints: &[Endpoint]) -> HandlerOutput {
    let mut packages: BTreeMap<String, Vec<HandlerPlan>> = BTreeMap::new();
    let mut needs_construction = BTreeSet::new();

    for endpoint in endpoints {
        needs_construction.insert(endpoint.package.clone());
        if endpoint.custom_handler {
            continue;
        }
        tracing::debug!(operation = %endpoint.label(), package = %endpoint.package, "planning handler");
        packages
            .entry(endpoint.package.clone())
            .or_default()
            .push(plan_handler(endpoint));
    }

    HandlerOutput {
        packages: packages
            .into_iter()
            .map(|(name, handlers)| HandlerPackage { name, handlers })
            .collect(),
        needs_construction,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{HttpMethod, ParamScope, ParamSpec, ValueKind, Visibility};

    fn endpoint(package: &str, operation_id: &str, response: ResponseShape) -> Endpoint {
        Endpoint {
            method: HttpMethod::Get,
            path: "/tickets".to_string(),
            visibility: Visibility::Protected,
            package: package.to_string(),
            operation_id: operation_id.to_string(),
            custom_handler: false,
            response,
            request: RequestShape::None,
            path_params: Vec::new(),
            query_params: Vec::new(),
            status: 200,
        }
    }

    fn query(name: &str, kind: ValueKind, required: bool) -> ParamSpec {
        ParamSpec {
            name: name.to_string(),
            ident: name.to_string(),
            scope: ParamScope::Query,
            kind,
            required,
        }
    }

    #[test]
    fn test_array_response_with_two_query_params() {
        let mut search = endpoint("ticket", "findTickets", ResponseShape::ArrayOfRef("Ticket".to_string()));
        search.query_params = vec![
            query("name", ValueKind::String, true),
            query("limit", ValueKind::Int32, false),
        ];

        let plan = plan_handler(&search);
        assert_eq!(plan.method_name, "FindTickets");
        assert_eq!(plan.extractions.len(), 2);
        assert!(!plan.extractions[0].fallible);
        assert!(plan.extractions[1].fallible);
        assert_eq!(
            plan.arguments,
            vec![
                CallArgument::Context,
                CallArgument::Param("name".to_string()),
                CallArgument::Param("limit".to_string()),
            ]
        );
        assert_eq!(plan.response, ResponseWrite::Json { status: 200 });
        assert!(plan.body.is_none());
    }

    #[test]
    fn test_argument_order_with_body_path_and_paging() {
        let mut paged = endpoint("ticket", "pageBranchTickets", ResponseShape::Paged { item: Some("Ticket".to_string()) });
        paged.request = RequestShape::ArrayOfRef("Filter".to_string());
        paged.path_params = vec![ParamSpec {
            name: "branchId".to_string(),
            ident: "branchId".to_string(),
            scope: ParamScope::Path,
            kind: ValueKind::Int64,
            required: true,
        }];
        paged.query_params = vec![query("status", ValueKind::String, false)];

        let plan = plan_handler(&paged);
        assert_eq!(
            plan.arguments,
            vec![
                CallArgument::Context,
                CallArgument::Body,
                CallArgument::Param("branchId".to_string()),
                CallArgument::Param("status".to_string()),
                CallArgument::Page,
                CallArgument::Size,
                CallArgument::Sort,
            ]
        );
        assert_eq!(plan.body, Some(BodyDecode::RecordList("Filter".to_string())));
        assert_eq!(plan.response, ResponseWrite::Page { status: 200 });
    }

    #[test]
    fn test_no_content_writes_bare_status() {
        let mut delete = endpoint("ticket", "deleteTicket", ResponseShape::None);
        delete.status = 204;
        assert_eq!(plan_handler(&delete).response, ResponseWrite::Status { status: 204 });
    }

    #[test]
    fn test_packages_grouped_and_construction_set_includes_custom() {
        let mut custom = endpoint("printer", "printTicket", ResponseShape::None);
        custom.custom_handler = true;
        let endpoints = vec![
            endpoint("ticket", "listTickets", ResponseShape::ArrayOfRef("Ticket".to_string())),
            custom,
            endpoint("branch", "listBranches", ResponseShape::ArrayOfRef("Branch".to_string())),
            endpoint("ticket", "countTickets", ResponseShape::None),
        ];

        let output = emit_handlers(&endpoints);
        let names: Vec<_> = output.packages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["branch", "ticket"]);
        assert_eq!(output.packages[1].handlers.len(), 2);
        assert_eq!(output.packages[1].handlers[0].operation_id, "listTickets");
        assert_eq!(
            output.needs_construction.into_iter().collect::<Vec<_>>(),
            vec!["branch", "printer", "ticket"]
        );
    }
}
