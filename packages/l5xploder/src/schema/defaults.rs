//! Split schema for controller exports.

use super::rule::SplitRule;
use super::sort::DependencySort;
use super::SplitSchema;
use crate::serializer::StructuredTextSerializer;
use crate::transform::RungNumberTransformer;

/// Create the schema for `RSLogix5000Content` documents.
///
/// ```text
/// Controller
/// ├── DataTypes/*                    DataTypes/<Name>
/// ├── Modules/*                      Modules/<Name>, parents before children
/// ├── AddOnInstructionDefinitions/*  AddOnInstructionDefinitions/<Name>/<Name>
/// │   └── Routines/*                 .../Routines/<Name> (.st for structured text)
/// ├── AlarmDefinitions/*
/// ├── Tags/*
/// ├── Programs/*                     Programs/<Name>/<Name>
/// │   ├── Tags/*
/// │   └── Routines/*
/// ├── Tasks/*
/// ├── Trends/*
/// └── DataLogs/*
/// ```
///
/// Parameters and local tags of add-on instructions stay inside the
/// instruction file; their order determines the data layout.
#[must_use]
pub fn create_l5x_schema() -> SplitSchema {
    SplitSchema::new([
        section("DataTypes"),
        section("Modules").with_sort(DependencySort::by_attribute("Modules", "ParentModule")),
        section("AddOnInstructionDefinitions")
            .with_sort(DependencySort::by_child_attribute(
                "AddOnInstructionDefinitions",
                "LocalTags/LocalTag",
                "DataType",
            ))
            .with_children([routines()]),
        section("AlarmDefinitions"),
        section("Tags"),
        section("Programs").with_children([nested("Tags"), routines()]),
        section("Tasks"),
        section("Trends"),
        section("DataLogs"),
    ])
}

/// `Controller/<name>/*` stored in folder `<name>`.
fn section(name: &str) -> SplitRule {
    SplitRule::new(format!("Controller/{name}/*").as_str()).with_folder(name)
}

/// `<name>/*` below an owning node, stored in folder `<name>`.
fn nested(name: &str) -> SplitRule {
    SplitRule::new(format!("{name}/*").as_str()).with_folder(name)
}

fn routines() -> SplitRule {
    nested("Routines")
        .with_serializer(StructuredTextSerializer)
        .with_transformer(RungNumberTransformer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::NameStrategy;

    #[test]
    fn test_section_order() {
        let schema = create_l5x_schema();
        let selectors: Vec<String> = schema
            .rules()
            .iter()
            .map(|r| r.selector.to_string())
            .collect();
        assert_eq!(
            selectors,
            vec![
                "Controller/DataTypes/*",
                "Controller/Modules/*",
                "Controller/AddOnInstructionDefinitions/*",
                "Controller/AlarmDefinitions/*",
                "Controller/Tags/*",
                "Controller/Programs/*",
                "Controller/Tasks/*",
                "Controller/Trends/*",
                "Controller/DataLogs/*",
            ]
        );
        assert_eq!(schema.root_name(), "RSLogix5000Content");
    }

    #[test]
    fn test_programs_nest_tags_and_routines() {
        let schema = create_l5x_schema();
        let programs = &schema.rules()[5];
        assert_eq!(programs.folder, NameStrategy::fixed("Programs"));
        assert_eq!(programs.children.len(), 2);

        let routines = &programs.children[1];
        assert_eq!(routines.selector.to_string(), "Routines/*");
        assert_eq!(routines.serializers[0].name(), "structured-text");
        assert_eq!(routines.transformers[0].name(), "rung-numbers");
    }

    #[test]
    fn test_sorted_sections() {
        let schema = create_l5x_schema();
        let sorted: Vec<_> = schema
            .rules()
            .iter()
            .filter_map(|r| r.sort.as_ref().map(|s| s.name().to_string()))
            .collect();
        assert_eq!(sorted, vec!["Modules", "AddOnInstructionDefinitions"]);
    }
}
