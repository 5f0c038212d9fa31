//! Endpoint classifier
//!
//! Walks operations in (path, method) order and turns each into an
//! [`Endpoint`]: owning package, visibility, success status and the shapes
//! of its request and response bodies.

use std::collections::BTreeMap;

use crate::generation::extensions::{operation_directives, page_envelope};
use crate::generation::params::{ParameterPlan, ParameterPlanner};
use crate::generation::resolver::TypeResolver;
use crate::generation::{
    ApiDocument, Endpoint, GenerationError, HttpMethod, MediaType, Operation, PathItem,
    RequestBody, RequestShape, Response, ResponseShape, TypeShape, Visibility,
};

/// Media types accepted for JSON bodies, in preference order
pub const JSON_MEDIA_TYPES: [&str; 2] = ["application/json", "application/json;charset=UTF-8"];

pub struct EndpointClassifier<'a> {
    document: &'a ApiDocument,
    resolver: TypeResolver<'a>,
    planner: ParameterPlanner<'a>,
}

impl<'a> EndpointClassifier<'a> {
    pub fn new(document: &'a ApiDocument) -> Self {
        Self {
            document,
            resolver: TypeResolver::new(document),
            planner: ParameterPlanner::new(document),
        }
    }

    /// Classify every operation; the first malformed one aborts the run
    pub fn classify(&self) -> Result<Vec<Endpoint>, GenerationError> {
        let mut endpoints = Vec::new();
        for (path, item) in &self.document.paths {
            for (method, operation) in &item.operations {
                endpoints.push(self.classify_operation(path, item, *method, operation)?);
            }
        }
        Ok(endpoints)
    }

    pub fn classify_operation(
        &self,
        path: &str,
        item: &PathItem,
        method: HttpMethod,
        operation: &Operation,
    ) -> Result<Endpoint, GenerationError> {
        let label = format!("{} {path}", method.display_name().to_uppercase());
        let directives = operation_directives(method, path, operation)?;

        let operation_id = operation
            .operation_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| GenerationError::MissingOperationId {
                method: method.display_name().to_uppercase(),
                path: path.to_string(),
            })?;

        let (status, response) = success_response(&label, &operation.responses)?;
        let response = self.classify_response(&label, response)?;

        let (request, plan) = if directives.custom_handler {
            tracing::debug!(operation = %label, package = %directives.package, "custom handler, wiring route only");
            (RequestShape::None, ParameterPlan::default())
        } else {
            let request = self.classify_request(&label, operation.request_body.as_ref())?;
            let plan = self.planner.plan(
                &label,
                path,
                &item.parameters,
                &operation.parameters,
                response.is_paged(),
            )?;
            (request, plan)
        };

        Ok(Endpoint {
            method,
            path: path.to_string(),
            visibility: if directives.is_public {
                Visibility::Public
            } else {
                Visibility::Protected
            },
            package: directives.package,
            operation_id,
            custom_handler: directives.custom_handler,
            response,
            request,
            path_params: plan.path_params,
            query_params: plan.query_params,
            status,
        })
    }

    fn classify_response(&self, label: &str, response: &Response) -> Result<ResponseShape, GenerationError> {
        let Some(media) = json_media(&response.content) else {
            if let Some(content_type) = response.content.keys().next() {
                tracing::warn!(operation = %label, content_type = %content_type, "response body is not JSON, writing status only");
            }
            return Ok(ResponseShape::None);
        };
        let Some(schema) = media.schema.as_ref() else {
            return Ok(ResponseShape::None);
        };

        if let Some(envelope) = page_envelope(self.document, schema)? {
            return match envelope.item {
                Some(item) => Ok(ResponseShape::Paged { item: Some(item) }),
                None => Err(GenerationError::unresolvable(
                    label,
                    "paging envelope does not reference a content item schema",
                )),
            };
        }

        let resolved = self.resolver.resolve(schema, true)?;
        Ok(match &resolved.shape {
            TypeShape::Array(element) => match &element.shape {
                TypeShape::Reference(name) => ResponseShape::ArrayOfRef(name.clone()),
                _ => ResponseShape::ArrayOfPrimitive(resolved),
            },
            TypeShape::Reference(name) => ResponseShape::SingleRef(name.clone()),
            _ => ResponseShape::SinglePrimitive(resolved),
        })
    }

    fn classify_request(&self, label: &str, body: Option<&RequestBody>) -> Result<RequestShape, GenerationError> {
        let Some(body) = body else {
            return Ok(RequestShape::None);
        };
        let Some(media) = json_media(&body.content) else {
            return match body.content.keys().next() {
                Some(content_type) => Err(GenerationError::UnsupportedContentType {
                    operation: label.to_string(),
                    content_type: content_type.clone(),
                }),
                None => Ok(RequestShape::None),
            };
        };
        let Some(schema) = media.schema.as_ref() else {
            return Ok(RequestShape::None);
        };

        let resolved = self.resolver.resolve(schema, true)?;
        Ok(match &resolved.shape {
            TypeShape::Reference(name) => RequestShape::SingleRef(name.clone()),
            TypeShape::Array(element) => match &element.shape {
                TypeShape::Reference(name) => RequestShape::ArrayOfRef(name.clone()),
                _ => RequestShape::PrimitiveOrArray(resolved),
            },
            _ => RequestShape::PrimitiveOrArray(resolved),
        })
    }
}

fn json_media(content: &BTreeMap<String, MediaType>) -> Option<&MediaType> {
    JSON_MEDIA_TYPES.iter().find_map(|media_type| content.get(*media_type))
}

/// Lowest declared 2xx response
fn success_response<'r>(
    label: &str,
    responses: &'r BTreeMap<String, Response>,
) -> Result<(u16, &'r Response), GenerationError> {
    let mut successes: Vec<(u16, &Response)> = responses
        .iter()
        .filter_map(|(code, response)| {
            code.parse::<u16>()
                .ok()
                .filter(|status| (200..300).contains(status))
                .map(|status| (status, response))
        })
        .collect();
    successes.sort_by_key(|(status, _)| *status);

    if successes.len() > 1 {
        let codes: Vec<u16> = successes.iter().map(|(status, _)| *status).collect();
        tracing::warn!(operation = %label, ?codes, "multiple success responses declared, using the lowest");
    }

    successes
        .into_iter()
        .next()
        .ok_or_else(|| GenerationError::MissingStatusCode(label.to_string()))
}
