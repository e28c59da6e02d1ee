//! Built-in pattern and filter functions
//!
//! Each direction has its own pattern and filter sets. Functions are
//! tagged variants with declared argument signatures; the parser validates
//! signatures at parse time and the engine dispatches on the variant.

use std::collections::BTreeMap;
use std::path::Path;

use rbxfs_format::Format as _;
use rbxfs_fs::io::read_dir_sorted;
use rbxfs_fs::path::is_valid_file_name;
use rbxfs_tree::{ClassCatalog, ObjectId, Selection, Tree};

use crate::action::{FileDef, InSelection, OutMap};
use crate::sidecar::Sidecar;
use crate::source::SourceMap;

use super::args::{Arg, ArgClass, ArgFileName, ArgKind, ArgName, ArgString};
use super::Direction;

/// Name lookup for the built-in function sets.
#[derive(Debug, Clone, Copy, Default)]
pub struct Registry;

impl Registry {
    pub fn new() -> Self {
        Self
    }

    /// Declared argument kinds of a pattern function, if it exists.
    pub fn pattern_signature(
        &self,
        direction: Direction,
        name: &str,
    ) -> Option<&'static [ArgKind]> {
        match direction {
            Direction::Out => OutPatternKind::from_name(name).map(OutPatternKind::signature),
            Direction::In => InPatternKind::from_name(name).map(InPatternKind::signature),
        }
    }

    /// Declared argument kinds of a filter function, if it exists.
    pub fn filter_signature(
        &self,
        direction: Direction,
        name: &str,
    ) -> Option<&'static [ArgKind]> {
        match direction {
            Direction::Out => OutFilterKind::from_name(name).map(OutFilterKind::signature),
            Direction::In => InFilterKind::from_name(name).map(InFilterKind::signature),
        }
    }

    pub fn out_pattern(&self, name: &str) -> Option<OutPatternKind> {
        OutPatternKind::from_name(name)
    }

    pub fn out_filter(&self, name: &str) -> Option<OutFilterKind> {
        OutFilterKind::from_name(name)
    }

    pub fn in_pattern(&self, name: &str) -> Option<InPatternKind> {
        InPatternKind::from_name(name)
    }

    pub fn in_filter(&self, name: &str) -> Option<InFilterKind> {
        InFilterKind::from_name(name)
    }
}

/// What an out-pattern selected from one object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternOutput {
    pub children: Vec<usize>,
    pub properties: Vec<String>,
}

impl PatternOutput {
    pub fn is_empty(&self) -> bool {
        self.children.is_empty() && self.properties.is_empty()
    }
}

type ExecResult<T> = std::result::Result<T, String>;

fn class_arg(args: &[Arg], index: usize) -> ExecResult<&ArgClass> {
    match args.get(index) {
        Some(Arg::Class(class)) => Ok(class),
        _ => Err(format!("argument #{index} is not a class")),
    }
}

fn name_arg(args: &[Arg], index: usize) -> ExecResult<&ArgName> {
    match args.get(index) {
        Some(Arg::Name(name)) => Ok(name),
        _ => Err(format!("argument #{index} is not a name")),
    }
}

fn string_arg(args: &[Arg], index: usize) -> ExecResult<&ArgString> {
    match args.get(index) {
        Some(Arg::String(text)) => Ok(text),
        _ => Err(format!("argument #{index} is not a string")),
    }
}

fn file_name_arg(args: &[Arg], index: usize) -> ExecResult<&ArgFileName> {
    match args.get(index) {
        Some(Arg::FileName(glob)) => Ok(glob),
        _ => Err(format!("argument #{index} is not a file name")),
    }
}

/// Whether `class_name` satisfies a class argument. Strict classes (and
/// catalog-less runs) compare by name; otherwise the catalog's
/// inheritance chain decides.
fn class_matches(
    catalog: Option<&ClassCatalog>,
    class: &ArgClass,
    class_name: &str,
) -> bool {
    match &class.name {
        ArgName::Any => true,
        ArgName::Literal(literal) => match catalog {
            Some(catalog) if !class.strict => catalog.inherits(class_name, literal),
            _ => class_name == literal,
        },
    }
}

// ------------------------------------------------------------ out patterns

/// Out-pattern functions: select children/properties of one object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutPatternKind {
    /// `Child(class)` - children matching a class.
    Child,
    /// `Property(class, prop, type)` - properties of a matching object.
    Property,
}

impl OutPatternKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Child" => Some(Self::Child),
            "Property" => Some(Self::Property),
            _ => None,
        }
    }

    pub fn signature(self) -> &'static [ArgKind] {
        match self {
            Self::Child => &[ArgKind::Class],
            Self::Property => &[ArgKind::Class, ArgKind::Name, ArgKind::Name],
        }
    }

    pub fn run(
        self,
        args: &[Arg],
        tree: &Tree,
        catalog: Option<&ClassCatalog>,
        object: ObjectId,
    ) -> ExecResult<PatternOutput> {
        match self {
            Self::Child => {
                let class = class_arg(args, 0)?;
                let mut output = PatternOutput::default();
                let children = tree.children(object);
                if class.name.is_any() {
                    output.children = (0..children.len()).collect();
                    return Ok(output);
                }
                for (index, &child) in children.iter().enumerate() {
                    if class_matches(catalog, class, tree.class_name(child)) {
                        output.children.push(index);
                    }
                }
                Ok(output)
            }
            Self::Property => {
                let class = class_arg(args, 0)?;
                let prop = name_arg(args, 1)?;
                let type_name = name_arg(args, 2)?;

                let mut output = PatternOutput::default();
                if !class.name.is_any()
                    && !class_matches(catalog, class, tree.class_name(object))
                {
                    return Ok(output);
                }
                for (name, value) in tree.properties(object) {
                    let prop_ok = prop.matches(name);
                    let type_ok = match type_name {
                        ArgName::Any => true,
                        ArgName::Literal(literal) => {
                            value.type_name().to_lowercase() == literal.to_lowercase()
                        }
                    };
                    if prop_ok && type_ok {
                        output.properties.push(name.to_string());
                    }
                }
                Ok(output)
            }
        }
    }
}

// ------------------------------------------------------------- out filters

/// Out-filter functions: map a pattern's selection to files/directories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutFilterKind {
    /// `File(name)` - all selected items into one file.
    File,
    /// `Directory()` - each selected child becomes a directory.
    Directory,
    /// `PropertyName(ext)` - each selected property becomes `name.ext`.
    PropertyName,
    /// `Ignore()` - record selected items as deliberately unmapped.
    Ignore,
}

impl OutFilterKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "File" => Some(Self::File),
            "Directory" => Some(Self::Directory),
            "PropertyName" => Some(Self::PropertyName),
            "Ignore" => Some(Self::Ignore),
            _ => None,
        }
    }

    pub fn signature(self) -> &'static [ArgKind] {
        match self {
            Self::File => &[ArgKind::String],
            Self::PropertyName => &[ArgKind::String],
            Self::Directory | Self::Ignore => &[],
        }
    }

    pub fn run(
        self,
        args: &[Arg],
        tree: &Tree,
        object: ObjectId,
        selected: &PatternOutput,
    ) -> ExecResult<Vec<OutMap>> {
        match self {
            Self::File => {
                let name = string_arg(args, 0)?;
                let ext = name.0.rsplit_once('.').map(|(_, e)| e).unwrap_or("");
                let format = rbxfs_format::from_extension(ext)
                    .ok_or_else(|| format!("unsupported file extension for `{}`", name.0))?;

                let selections = vec![Selection {
                    object,
                    children: selected.children.clone(),
                    properties: selected.properties.clone(),
                }];
                if !format.can_encode(tree, &selections) {
                    return Err(format!(
                        "selection not supported by {} format",
                        format.name()
                    ));
                }
                Ok(vec![OutMap {
                    file: FileDef::file(name.0.clone()),
                    selections,
                }])
            }
            Self::Directory => {
                if !selected.properties.is_empty() {
                    return Err("properties not supported".to_string());
                }

                // Duplicate names among the selected children cannot both
                // become directories; skip every claimant.
                let mut name_counts: BTreeMap<&str, usize> = BTreeMap::new();
                for &index in &selected.children {
                    if let Some(child) = tree.child(object, index) {
                        *name_counts.entry(tree.name(child)).or_default() += 1;
                    }
                }

                let mut maps = Vec::new();
                for &index in &selected.children {
                    let Some(child) = tree.child(object, index) else {
                        continue;
                    };
                    let child_name = tree.name(child);
                    if !is_valid_file_name(child_name) {
                        continue;
                    }
                    if name_counts.get(child_name).copied().unwrap_or(0) > 1 {
                        continue;
                    }
                    maps.push(OutMap {
                        file: FileDef::dir(child_name),
                        selections: vec![Selection::with_children(object, vec![index])],
                    });
                }
                Ok(maps)
            }
            Self::PropertyName => {
                if !selected.children.is_empty() {
                    return Err("objects not supported".to_string());
                }
                let ext = string_arg(args, 0)?.0.to_lowercase();
                let format: Box<dyn rbxfs_format::Format> = match ext.as_str() {
                    "bin" => Box::new(rbxfs_format::raw::BIN),
                    "lua" => Box::new(rbxfs_format::raw::LUA),
                    "txt" => Box::new(rbxfs_format::raw::TXT),
                    _ => return Err("unsupported format".to_string()),
                };

                let mut maps = Vec::new();
                for name in &selected.properties {
                    let file = format!("{name}.{ext}");
                    if !is_valid_file_name(&file) {
                        continue;
                    }
                    let selections =
                        vec![Selection::with_properties(object, vec![name.clone()])];
                    if !format.can_encode(tree, &selections) {
                        // Wrong value type for this payload format.
                        continue;
                    }
                    maps.push(OutMap {
                        file: FileDef::file(file),
                        selections,
                    });
                }
                Ok(maps)
            }
            Self::Ignore => Ok(vec![OutMap {
                file: FileDef::ignore(),
                selections: vec![Selection {
                    object,
                    children: selected.children.clone(),
                    properties: selected.properties.clone(),
                }],
            }]),
        }
    }
}

// ------------------------------------------------------------- in patterns

/// In-pattern functions: select files of the current repo subdirectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InPatternKind {
    /// `File(glob)` - non-directory entries matching a glob.
    File,
    /// `Directory(class, glob)` - directory entries, optionally filtered
    /// by the sidecar's class.
    Directory,
}

impl InPatternKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "File" => Some(Self::File),
            "Directory" => Some(Self::Directory),
            _ => None,
        }
    }

    pub fn signature(self) -> &'static [ArgKind] {
        match self {
            Self::File => &[ArgKind::FileName],
            Self::Directory => &[ArgKind::Class, ArgKind::FileName],
        }
    }

    pub fn run(
        self,
        args: &[Arg],
        dir: &Path,
        catalog: Option<&ClassCatalog>,
    ) -> ExecResult<Vec<String>> {
        match self {
            Self::File => {
                let glob = file_name_arg(args, 0)?;
                let entries = read_dir_sorted(dir).map_err(|e| e.to_string())?;
                Ok(entries
                    .into_iter()
                    .filter(|entry| !entry.is_dir && glob.matches(&entry.name))
                    .map(|entry| entry.name)
                    .collect())
            }
            Self::Directory => {
                let class = class_arg(args, 0)?;
                let glob = file_name_arg(args, 1)?;
                let entries = read_dir_sorted(dir).map_err(|e| e.to_string())?;

                let mut files = Vec::new();
                for entry in entries {
                    if !entry.is_dir {
                        continue;
                    }
                    if !class.name.is_any() {
                        // A directory with an unreadable or classless
                        // sidecar cannot be class-filtered; leave it out.
                        let sidecar = match Sidecar::read(&dir.join(&entry.name)) {
                            Ok(sidecar) => sidecar,
                            Err(_) => continue,
                        };
                        if sidecar.class_name.is_empty()
                            || !class_matches(catalog, class, &sidecar.class_name)
                        {
                            continue;
                        }
                    }
                    if glob.matches(&entry.name) {
                        files.push(entry.name);
                    }
                }
                Ok(files)
            }
        }
    }
}

// -------------------------------------------------------------- in filters

/// In-filter functions: turn matched sources into selection plans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InFilterKind {
    /// `Children()` - adopt every child of every source.
    Children,
    /// `Properties()` - copy every named property of every source.
    Properties,
    /// `Property(name)` - one source's single value becomes `name`.
    Property,
    /// `PropertyName()` - each source's single value becomes the property
    /// named by the file's stem.
    PropertyName,
    /// `Ignore()` - mark every matched source ignored.
    Ignore,
}

impl InFilterKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Children" => Some(Self::Children),
            "Properties" => Some(Self::Properties),
            "Property" => Some(Self::Property),
            "PropertyName" => Some(Self::PropertyName),
            "Ignore" => Some(Self::Ignore),
            _ => None,
        }
    }

    pub fn signature(self) -> &'static [ArgKind] {
        match self {
            Self::Property => &[ArgKind::String],
            _ => &[],
        }
    }

    pub fn run(self, args: &[Arg], sources: &[SourceMap<'_>]) -> ExecResult<Vec<InSelection>> {
        match self {
            Self::Children => {
                for source in sources {
                    if !source.source.properties.is_empty() || !source.source.values.is_empty()
                    {
                        return Err(format!(
                            "source `{}` is not compatible with Children()",
                            source.file
                        ));
                    }
                }
                Ok(sources
                    .iter()
                    .map(|source| InSelection {
                        children: (0..source.source.children.len()).collect(),
                        ..InSelection::new(source.file.as_str())
                    })
                    .collect())
            }
            Self::Properties => {
                for source in sources {
                    if !source.source.children.is_empty() || !source.source.values.is_empty() {
                        return Err(format!(
                            "source `{}` is not compatible with Properties()",
                            source.file
                        ));
                    }
                }
                Ok(sources
                    .iter()
                    .map(|source| InSelection {
                        properties: source.source.properties.keys().cloned().collect(),
                        ..InSelection::new(source.file.as_str())
                    })
                    .collect())
            }
            Self::Property => {
                let name = string_arg(args, 0)?;
                let [source] = sources else {
                    return Err(format!(
                        "Property() must match exactly one file, got {}",
                        sources.len()
                    ));
                };
                if !source.source.children.is_empty()
                    || !source.source.properties.is_empty()
                    || source.source.values.len() != 1
                {
                    return Err(format!(
                        "source `{}` is not compatible with Property()",
                        source.file
                    ));
                }
                Ok(vec![InSelection {
                    values: [(name.0.clone(), 0)].into(),
                    ..InSelection::new(source.file.as_str())
                }])
            }
            Self::PropertyName => {
                for source in sources {
                    if !source.source.children.is_empty()
                        || !source.source.properties.is_empty()
                        || source.source.values.len() != 1
                    {
                        return Err(format!(
                            "source `{}` is not compatible with PropertyName()",
                            source.file
                        ));
                    }
                }
                Ok(sources
                    .iter()
                    .map(|source| {
                        let stem = source
                            .file
                            .rsplit_once('.')
                            .map(|(stem, _)| stem)
                            .unwrap_or(&source.file);
                        InSelection {
                            values: [(stem.to_string(), 0)].into(),
                            ..InSelection::new(source.file.as_str())
                        }
                    })
                    .collect())
            }
            Self::Ignore => Ok(sources
                .iter()
                .map(|source| InSelection {
                    ignore: true,
                    ..InSelection::new(source.file.as_str())
                })
                .collect()),
        }
    }
}
