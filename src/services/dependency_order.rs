// 依存関係順序の解決
//
// リレーションフィールドによるコレクション間の依存を解析し、
// 参照先が参照元より先に作成される順序を求めます。

use crate::core::catalog::Catalog;
use crate::core::collection::Collection;
use crate::core::error::{ErrorLocation, ValidationError};
use std::collections::BTreeSet;

/// カタログを依存関係順に並べる
///
/// 準備できたコレクションのうち宣言順が最も早いものから取り出すため、
/// 依存関係を満たした宣言順はそのまま保たれます。
/// 自己参照とカタログ外（システムコレクション）への参照は無視します。
///
/// # Errors
///
/// 循環参照がある場合は、循環に含まれるコレクション名を含む参照エラーを返します。
pub fn resolve(catalog: &Catalog) -> Result<Vec<&Collection>, ValidationError> {
    let collections = catalog.collections();

    // dependents[i] = i を参照するコレクションの位置
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); collections.len()];
    let mut in_degree = vec![0usize; collections.len()];

    for (index, collection) in collections.iter().enumerate() {
        for target in collection.relation_targets() {
            if let Some(target_index) = catalog.position(target) {
                if target_index != index {
                    dependents[target_index].push(index);
                    in_degree[index] += 1;
                }
            }
        }
    }

    let mut ready: BTreeSet<usize> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, degree)| **degree == 0)
        .map(|(index, _)| index)
        .collect();
    let mut ordered = Vec::with_capacity(collections.len());

    while let Some(index) = ready.pop_first() {
        ordered.push(&collections[index]);
        for &dependent in &dependents[index] {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                ready.insert(dependent);
            }
        }
    }

    if ordered.len() < collections.len() {
        let cyclic: Vec<&str> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, degree)| **degree > 0)
            .map(|(index, _)| collections[index].name.as_str())
            .collect();

        return Err(ValidationError::Reference {
            message: format!("Circular relation between collections: {}", cyclic.join(", ")),
            location: cyclic.first().map(|name| ErrorLocation::with_collection(name)),
            suggestion: Some("Make one of the relations optional and add it in a later migration".to_string()),
        });
    }

    Ok(ordered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::itinerary_catalog;
    use crate::core::collection::Field;

    fn names<'a>(ordered: &[&'a Collection]) -> Vec<&'a str> {
        ordered.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_itinerary_catalog_keeps_declaration_order() {
        let catalog = itinerary_catalog();
        let ordered = resolve(&catalog).unwrap();

        assert_eq!(names(&ordered), catalog.collection_names());
    }

    #[test]
    fn test_parents_move_before_children() {
        let catalog = Catalog::new("1", "test")
            .with_collection(
                Collection::base("rooms")
                    .with_field(Field::relation("hotel", "hotel", "hotels").required()),
            )
            .with_collection(Collection::base("notes").with_field(Field::text("body")))
            .with_collection(
                Collection::base("hotels")
                    .with_field(Field::relation("city", "city", "cities").required()),
            )
            .with_collection(Collection::base("cities").with_field(Field::text("name")));

        let ordered = resolve(&catalog).unwrap();

        assert_eq!(names(&ordered), vec!["notes", "cities", "hotels", "rooms"]);
    }

    #[test]
    fn test_self_relation_is_ignored() {
        let catalog = Catalog::new("1", "test").with_collection(
            Collection::base("destinations")
                .with_field(Field::text("name"))
                .with_field(Field::relation("parent", "parent", "destinations")),
        );

        assert_eq!(names(&resolve(&catalog).unwrap()), vec!["destinations"]);
    }

    #[test]
    fn test_cycle_is_rejected() {
        let catalog = Catalog::new("1", "test")
            .with_collection(Collection::base("a").with_field(Field::relation("b", "b", "b")))
            .with_collection(Collection::base("b").with_field(Field::relation("a", "a", "a")))
            .with_collection(Collection::base("c").with_field(Field::text("name")));

        let error = resolve(&catalog).unwrap_err();

        assert!(error.is_reference());
        assert!(error.message().ends_with(": a, b"));
    }
}
