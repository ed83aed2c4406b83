//! Splits interface methods into named groups.
//!
//! A method is attributed to an OpenAPI operation when the operation's
//! identifier occurs in the method's doc comment (see [`MatchMode`]). The
//! reserved [`ERROR_HANDLER_METHOD`] is set aside before matching, and
//! every method no operation claims ends up in [`UNMATCHED_GROUP`] so that
//! nothing is silently dropped.

use std::fmt;
use std::str::FromStr;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PostgenError;
use crate::naming::{method_group_name, path_group_name, tag_group_name};
use crate::openapi::SpecModel;
use crate::shared::{ERROR_HANDLER_METHOD, MethodDescriptor, MethodGroup, UNMATCHED_GROUP};

/// How interface methods are distributed over groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// One `<Method>Handler` group per method.
    Each,
    /// One `<Tag>Service` group per declared tag.
    Tags,
    /// One `<Path>Service` group per path item.
    #[default]
    Paths,
}

impl FromStr for Strategy {
    type Err = PostgenError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "each" => Ok(Self::Each),
            "tag" | "tags" => Ok(Self::Tags),
            "paths" => Ok(Self::Paths),
            other => Err(PostgenError::UnsupportedStrategy(other.to_string())),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Each => "each",
            Self::Tags => "tag",
            Self::Paths => "paths",
        };
        formatter.write_str(label)
    }
}

/// Rule deciding whether a doc comment refers to an operation identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// The identifier is a whitespace-delimited token of the comment.
    ///
    /// `list` does not match a comment mentioning only `listItems`.
    #[default]
    Word,
    /// The identifier occurs anywhere in the comment.
    Contains,
}

impl MatchMode {
    /// An empty identifier never matches.
    pub fn matches(self, doc_comment: &str, identifier: &str) -> bool {
        if identifier.is_empty() {
            return false;
        }

        match self {
            Self::Word => doc_comment.split_whitespace().any(|token| token == identifier),
            Self::Contains => doc_comment.contains(identifier),
        }
    }
}

impl FromStr for MatchMode {
    type Err = PostgenError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "word" => Ok(Self::Word),
            "contains" => Ok(Self::Contains),
            other => Err(PostgenError::UnsupportedMatchMode(other.to_string())),
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Word => "word",
            Self::Contains => "contains",
        })
    }
}

/// Groups plus the bookkeeping the assembler needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionResult {
    /// Named groups in deterministic order; the unmatched group, if any, is last.
    pub groups: Vec<MethodGroup>,
    /// Names of methods attributed to at least one group by matching.
    pub matched_names: IndexSet<String>,
    /// The reserved error constructor, set aside before matching.
    pub error_handler: Option<MethodDescriptor>,
}

impl PartitionResult {
    pub fn unmatched(&self) -> Option<&MethodGroup> {
        self.groups.iter().find(|group| group.is_unmatched())
    }
}

/// Applies a [`Strategy`] with a given [`MatchMode`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Partitioner {
    strategy: Strategy,
    match_mode: MatchMode,
}

impl Partitioner {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            match_mode: MatchMode::default(),
        }
    }

    pub fn match_mode(mut self, match_mode: MatchMode) -> Self {
        self.match_mode = match_mode;
        self
    }

    /// Partitions `methods` using operations from `spec`.
    ///
    /// Never fails: methods without a matching operation grow the unmatched
    /// group instead.
    pub fn partition(&self, methods: &[MethodDescriptor], spec: &SpecModel) -> PartitionResult {
        let error_handler = methods
            .iter()
            .find(|method| method.name == ERROR_HANDLER_METHOD)
            .cloned();
        let candidates: Vec<&MethodDescriptor> = methods
            .iter()
            .filter(|method| !method.is_error_handler())
            .collect();

        let mut matched_names = IndexSet::new();
        let mut groups = match self.strategy {
            Strategy::Each => each_groups(&candidates, &mut matched_names),
            Strategy::Tags => self.tag_groups(&candidates, spec, &mut matched_names),
            Strategy::Paths => self.path_groups(&candidates, spec, &mut matched_names),
        };

        if self.strategy != Strategy::Each {
            if let Some(unmatched) = unmatched_group(&candidates, &matched_names) {
                debug!(count = unmatched.methods.len(), "methods left unmatched");
                groups.push(unmatched);
            }
        }

        PartitionResult {
            groups,
            matched_names,
            error_handler,
        }
    }

    fn tag_groups(
        &self,
        candidates: &[&MethodDescriptor],
        spec: &SpecModel,
        matched_names: &mut IndexSet<String>,
    ) -> Vec<MethodGroup> {
        // group name -> operation identifiers, in order of first tag appearance
        let mut keyed: IndexMap<String, Vec<&str>> = IndexMap::new();
        for item in spec.path_items() {
            for operation in &item.operations {
                for tag in &operation.tags {
                    if !spec.is_declared(tag) {
                        continue;
                    }
                    keyed
                        .entry(tag_group_name(tag))
                        .or_default()
                        .push(operation.identifier.as_str());
                }
            }
        }

        self.build_groups(keyed, candidates, matched_names)
    }

    fn path_groups(
        &self,
        candidates: &[&MethodDescriptor],
        spec: &SpecModel,
        matched_names: &mut IndexSet<String>,
    ) -> Vec<MethodGroup> {
        // `/items` and `/items/` share a name and therefore a group
        let mut keyed: IndexMap<String, Vec<&str>> = IndexMap::new();
        for item in spec.path_items() {
            if item.operations.is_empty() {
                continue;
            }
            keyed.entry(path_group_name(&item.path)).or_default().extend(
                item.operations
                    .iter()
                    .map(|operation| operation.identifier.as_str()),
            );
        }

        self.build_groups(keyed, candidates, matched_names)
    }

    fn build_groups(
        &self,
        keyed: IndexMap<String, Vec<&str>>,
        candidates: &[&MethodDescriptor],
        matched_names: &mut IndexSet<String>,
    ) -> Vec<MethodGroup> {
        keyed
            .into_iter()
            .map(|(name, identifiers)| {
                let mut group = MethodGroup::new(name);
                self.collect_matches(&mut group, candidates, &identifiers, matched_names);
                group
            })
            .collect()
    }

    /// Appends every candidate whose comment matches one of `identifiers`.
    fn collect_matches(
        &self,
        group: &mut MethodGroup,
        candidates: &[&MethodDescriptor],
        identifiers: &[&str],
        matched_names: &mut IndexSet<String>,
    ) {
        for method in candidates {
            let Some(identifier) = identifiers
                .iter()
                .find(|identifier| self.match_mode.matches(&method.doc_comment, identifier))
            else {
                continue;
            };

            debug!(
                group = %group.name,
                method = %method.name,
                operation = %identifier,
                "matched method"
            );
            group.push(method);
            matched_names.insert(method.name.clone());
        }
    }
}

/// Partitions with the default [`MatchMode`].
pub fn partition(
    methods: &[MethodDescriptor],
    spec: &SpecModel,
    strategy: Strategy,
) -> PartitionResult {
    Partitioner::new(strategy).partition(methods, spec)
}

fn each_groups(
    candidates: &[&MethodDescriptor],
    matched_names: &mut IndexSet<String>,
) -> Vec<MethodGroup> {
    candidates
        .iter()
        .map(|method| {
            matched_names.insert(method.name.clone());
            MethodGroup {
                name: method_group_name(&method.name),
                methods: vec![(*method).clone()],
            }
        })
        .collect()
}

fn unmatched_group(
    candidates: &[&MethodDescriptor],
    matched_names: &IndexSet<String>,
) -> Option<MethodGroup> {
    let mut group = MethodGroup::new(UNMATCHED_GROUP);
    for method in candidates {
        if !matched_names.contains(&method.name) {
            group.push(method);
        }
    }

    (!group.methods.is_empty()).then_some(group)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openapi::{Operation, PathItem};
    use crate::shared::Parameter;

    fn method(name: &str, doc: &str) -> MethodDescriptor {
        MethodDescriptor::new(
            name,
            doc,
            vec![Parameter::named("ctx", "context.Context")],
            vec![Parameter::unnamed("error")],
        )
    }

    fn error_handler() -> MethodDescriptor {
        MethodDescriptor::new(
            ERROR_HANDLER_METHOD,
            "NewError creates *ErrorStatusCode from error returned by handler.\n",
            vec![
                Parameter::named("ctx", "context.Context"),
                Parameter::named("err", "error"),
            ],
            vec![Parameter::unnamed("*ErrorStatusCode")],
        )
    }

    fn items_methods() -> Vec<MethodDescriptor> {
        vec![
            method("ListItems", "ListItems implements listItems operation.\n"),
            error_handler(),
        ]
    }

    fn items_spec() -> SpecModel {
        SpecModel::new(
            vec![PathItem::new(
                "/items",
                vec![Operation::new("listItems", ["items"])],
            )],
            ["items"],
        )
    }

    fn names(group: &MethodGroup) -> Vec<&str> {
        group.methods.iter().map(|m| m.name.as_str()).collect()
    }

    fn group_names(result: &PartitionResult) -> Vec<&str> {
        result.groups.iter().map(|g| g.name.as_str()).collect()
    }

    #[test]
    fn word_mode_ignores_identifier_prefixes() {
        let doc = "ListItems implements listItems operation.";
        assert!(MatchMode::Word.matches(doc, "listItems"));
        assert!(!MatchMode::Word.matches(doc, "list"));
        assert!(MatchMode::Contains.matches(doc, "list"));
        assert!(!MatchMode::Contains.matches(doc, ""));
    }

    #[test]
    fn parses_strategy_names() {
        assert_eq!("each".parse::<Strategy>().unwrap(), Strategy::Each);
        assert_eq!("tag".parse::<Strategy>().unwrap(), Strategy::Tags);
        assert_eq!("tags".parse::<Strategy>().unwrap(), Strategy::Tags);
        assert_eq!("paths".parse::<Strategy>().unwrap(), Strategy::Paths);
        assert!(matches!(
            "bogus".parse::<Strategy>(),
            Err(PostgenError::UnsupportedStrategy(value)) if value == "bogus"
        ));
    }

    #[test]
    fn tags_group_by_declared_tag() {
        let result = partition(&items_methods(), &items_spec(), Strategy::Tags);

        assert_eq!(group_names(&result), vec!["ItemsService"]);
        assert_eq!(names(&result.groups[0]), vec!["ListItems"]);
        assert_eq!(
            result.error_handler.as_ref().map(|m| m.name.as_str()),
            Some(ERROR_HANDLER_METHOD)
        );
    }

    #[test]
    fn paths_group_by_path() {
        let result = partition(&items_methods(), &items_spec(), Strategy::Paths);

        assert_eq!(group_names(&result), vec!["ItemsService"]);
        assert_eq!(names(&result.groups[0]), vec!["ListItems"]);
    }

    #[test]
    fn each_creates_one_group_per_method() {
        let methods = vec![
            method("ListItems", ""),
            method("GetItem", ""),
            method("Unrelated", ""),
            error_handler(),
        ];
        let result = partition(&methods, &SpecModel::default(), Strategy::Each);

        assert_eq!(
            group_names(&result),
            vec!["ListItemsHandler", "GetItemHandler", "UnrelatedHandler"]
        );
        assert!(result.groups.iter().all(|group| group.methods.len() == 1));
        assert!(result.unmatched().is_none());
        assert_eq!(result.matched_names.len(), 3);
    }

    #[test]
    fn unknown_operations_land_in_unmatched_group() {
        let methods = vec![
            method("ListItems", "ListItems implements listItems operation.\n"),
            method("Ping", "Ping checks liveness.\n"),
            error_handler(),
        ];

        for strategy in [Strategy::Tags, Strategy::Paths] {
            let result = partition(&methods, &items_spec(), strategy);
            let unmatched = result.unmatched().expect("unmatched group");
            assert_eq!(names(unmatched), vec!["Ping"]);
            assert_eq!(result.groups.last().map(|g| g.name.as_str()), Some(UNMATCHED_GROUP));
        }
    }

    #[test]
    fn empty_document_leaves_everything_unmatched() {
        let methods = vec![
            method("ListItems", "ListItems implements listItems operation.\n"),
            method("GetItem", "GetItem implements getItem operation.\n"),
            error_handler(),
        ];

        for strategy in [Strategy::Tags, Strategy::Paths] {
            let result = partition(&methods, &SpecModel::default(), strategy);
            assert_eq!(group_names(&result), vec![UNMATCHED_GROUP]);
            assert_eq!(names(&result.groups[0]), vec!["ListItems", "GetItem"]);
            assert!(result.matched_names.is_empty());
        }
    }

    #[test]
    fn undeclared_tags_do_not_form_groups() {
        let spec = SpecModel::new(
            vec![PathItem::new(
                "/items",
                vec![Operation::new("listItems", ["internal"])],
            )],
            ["items"],
        );
        let result = partition(&items_methods(), &spec, Strategy::Tags);

        assert_eq!(group_names(&result), vec![UNMATCHED_GROUP]);
    }

    #[test]
    fn multi_tag_operations_fan_out() {
        let spec = SpecModel::new(
            vec![
                PathItem::new("/items", vec![Operation::new("listItems", ["items", "catalog"])]),
                PathItem::new("/orders", vec![Operation::new("listOrders", ["orders"])]),
            ],
            ["orders", "catalog", "items"],
        );
        let methods = vec![
            method("ListItems", "ListItems implements listItems operation.\n"),
            method("ListOrders", "ListOrders implements listOrders operation.\n"),
        ];
        let result = partition(&methods, &spec, Strategy::Tags);

        assert_eq!(
            group_names(&result),
            vec!["ItemsService", "CatalogService", "OrdersService"]
        );
        assert_eq!(names(&result.groups[0]), vec!["ListItems"]);
        assert_eq!(names(&result.groups[1]), vec!["ListItems"]);
        assert_eq!(names(&result.groups[2]), vec!["ListOrders"]);
    }

    #[test]
    fn tag_groups_merge_paths_and_keep_declaration_order() {
        let spec = SpecModel::new(
            vec![
                PathItem::new("/items/{id}", vec![Operation::new("getItem", ["items"])]),
                PathItem::new("/items", vec![Operation::new("listItems", ["items"])]),
            ],
            ["items"],
        );
        let methods = vec![
            method("ListItems", "ListItems implements listItems operation.\n"),
            method("GetItem", "GetItem implements getItem operation.\n"),
        ];
        let result = partition(&methods, &spec, Strategy::Tags);

        assert_eq!(group_names(&result), vec!["ItemsService"]);
        assert_eq!(names(&result.groups[0]), vec!["ListItems", "GetItem"]);
    }

    #[test]
    fn colliding_path_names_share_one_group() {
        let spec = SpecModel::new(
            vec![
                PathItem::new("/items/", vec![Operation::new("createItem", ["items"])]),
                PathItem::new("/items", vec![Operation::new("listItems", ["items"])]),
            ],
            ["items"],
        );
        let methods = vec![
            method("ListItems", "ListItems implements listItems operation.\n"),
            method("CreateItem", "CreateItem implements createItem operation.\n"),
        ];
        let result = partition(&methods, &spec, Strategy::Paths);

        assert_eq!(group_names(&result), vec!["ItemsService"]);
        assert_eq!(names(&result.groups[0]), vec!["ListItems", "CreateItem"]);
    }

    #[test]
    fn colliding_tag_names_share_one_group() {
        let spec = SpecModel::new(
            vec![
                PathItem::new("/a", vec![Operation::new("listItems", ["pet-store"])]),
                PathItem::new("/b", vec![Operation::new("getItem", ["pet_store"])]),
            ],
            ["pet-store", "pet_store"],
        );
        let methods = vec![
            method("ListItems", "ListItems implements listItems operation.\n"),
            method("GetItem", "GetItem implements getItem operation.\n"),
        ];
        let result = partition(&methods, &spec, Strategy::Tags);

        assert_eq!(group_names(&result), vec!["PetStoreService"]);
        assert_eq!(names(&result.groups[0]), vec!["ListItems", "GetItem"]);
    }

    #[test]
    fn contains_mode_matches_overlapping_identifiers() {
        let spec = SpecModel::new(
            vec![
                PathItem::new("/list", vec![Operation::new("list", Vec::<String>::new())]),
                PathItem::new("/items", vec![Operation::new("listItems", Vec::<String>::new())]),
            ],
            Vec::<String>::new(),
        );
        let methods = vec![method("ListItems", "ListItems implements listItems operation.\n")];

        let word = Partitioner::new(Strategy::Paths).partition(&methods, &spec);
        assert_eq!(names(&word.groups[0]), Vec::<&str>::new());
        assert_eq!(names(&word.groups[1]), vec!["ListItems"]);

        let contains = Partitioner::new(Strategy::Paths)
            .match_mode(MatchMode::Contains)
            .partition(&methods, &spec);
        assert_eq!(names(&contains.groups[0]), vec!["ListItems"]);
        assert_eq!(names(&contains.groups[1]), vec!["ListItems"]);
    }

    #[test]
    fn paths_without_operations_are_skipped() {
        let spec = SpecModel::new(
            vec![
                PathItem::new("/empty", Vec::new()),
                PathItem::new("/items", vec![Operation::new("listItems", ["items"])]),
            ],
            ["items"],
        );
        let result = partition(&items_methods(), &spec, Strategy::Paths);

        assert_eq!(group_names(&result), vec!["ItemsService"]);
    }

    #[test]
    fn every_method_is_accounted_for() {
        let methods = vec![
            method("ListItems", "ListItems implements listItems operation.\n"),
            method("Ping", ""),
            error_handler(),
        ];

        for strategy in [Strategy::Each, Strategy::Tags, Strategy::Paths] {
            let result = partition(&methods, &items_spec(), strategy);
            let mut seen: IndexSet<&str> = result
                .groups
                .iter()
                .flat_map(|group| group.methods.iter().map(|m| m.name.as_str()))
                .collect();
            if let Some(handler) = &result.error_handler {
                seen.insert(handler.name.as_str());
            }
            for method in &methods {
                assert!(seen.contains(method.name.as_str()), "{strategy}: {} missing", method.name);
            }
        }
    }
}
