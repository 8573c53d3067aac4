use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use phylotree::tree::Tree;
use std::collections::HashMap;

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::builder::Partition;
use crate::error::{ClusterError, Result};
use crate::matrix::SquareMatrix;
use crate::split::Pair;

/// Strip BEAST annotations from Newick strings.
///
/// BEAST format includes annotations like :[&rate=0.123]2.45 where 2.45 is the actual branch length.
/// This function removes the [&...] annotations while preserving the branch lengths.
fn strip_beast_annotations(newick: &str) -> String {
    let mut result = String::with_capacity(newick.len());
    let mut in_annotation = false;
    let mut chars = newick.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '[' && chars.peek() == Some(&'&') {
            in_annotation = true;
        } else if ch == ']' && in_annotation {
            in_annotation = false;
        } else if !in_annotation {
            result.push(ch);
        }
    }

    result
}

/// Parse one Newick tree, ignoring BEAST `[&...]` annotations and surrounding whitespace.
pub fn parse_newick(newick: &str) -> Result<Tree> {
    let cleaned = strip_beast_annotations(newick);
    Tree::from_newick(cleaned.trim()).map_err(|e| ClusterError::Newick(e.to_string()))
}

/// Read a whole text file, gunzipping when the name ends in `.gz`.
fn read_text<P: AsRef<Path>>(path: P) -> Result<String> {
    let p = path.as_ref();
    if p.to_string_lossy().ends_with(".gz") {
        let mut content = String::new();
        MultiGzDecoder::new(File::open(p)?).read_to_string(&mut content)?;
        Ok(content)
    } else {
        Ok(fs::read_to_string(p)?)
    }
}

fn open_lines<P: AsRef<Path>>(path: P) -> Result<Box<dyn BufRead>> {
    let p = path.as_ref();
    let file = File::open(p)?;
    if p.to_string_lossy().ends_with(".gz") {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Run `write` against an output sink: `-` is stdout, a `.gz` suffix means gzip-compressed.
///
/// The sink is flushed, and a gzip stream finished, before returning.
fn with_writer<P, F>(path: P, write: F) -> io::Result<()>
where
    P: AsRef<Path>,
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    let p = path.as_ref();
    if p.as_os_str() == "-" {
        let mut out = BufWriter::new(io::stdout().lock());
        write(&mut out)?;
        return out.flush();
    }
    let f = File::create(p)?;
    if p.to_string_lossy().ends_with(".gz") {
        let mut out = BufWriter::new(GzEncoder::new(f, Compression::default()));
        write(&mut out)?;
        out.into_inner().map_err(io::IntoInnerError::into_error)?.finish()?;
        Ok(())
    } else {
        let mut out = BufWriter::new(f);
        write(&mut out)?;
        out.flush()
    }
}

/// Read a tree from a Newick file or from the first tree of a NEXUS/BEAST file.
///
/// NEXUS leaves are renamed through the TRANSLATE block when there is one.
pub fn read_tree<P: AsRef<Path>>(path: P) -> Result<Tree> {
    let content = read_text(path.as_ref())?;

    if !content.trim_start().to_ascii_uppercase().starts_with("#NEXUS") {
        return parse_newick(&content);
    }

    let taxons = parse_taxon_block(&content);
    let block = collect_tree_blocks(&content)
        .into_iter()
        .next()
        .ok_or_else(|| ClusterError::Newick(format!("no TREE statement in {}", path.as_ref().display())))?;
    let mut tree = parse_newick(&block.body)?;
    if !taxons.is_empty() {
        rename_leaf_nodes(&mut tree, &taxons);
    }
    Ok(tree)
}

struct TreeBlock { body: String }

fn collect_tree_blocks(content: &str) -> Vec<TreeBlock> {
    content
        .lines()
        .skip_while(|line| !line.trim_start().to_ascii_uppercase().starts_with("TREE "))
        .take_while(|line| !line.trim().to_ascii_uppercase().starts_with("END;"))
        .filter_map(|line| {
            // header annotations such as `[&lnP=-1234.5]` carry their own `=`
            let line = strip_beast_annotations(line);
            let (_header, body) = line.split_once('=')?;
            Some(TreeBlock { body: body.trim().to_string() })
        })
        .collect()
}

fn parse_taxon_block(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .skip_while(|line| !line.trim().to_ascii_uppercase().starts_with("TRANSLATE"))
        .skip(1)
        .take_while(|line| !line.trim().starts_with(';'))
        // STRUCTURE:
        // 1 'Homo_sapiens',
        // 2 'Pan_troglodytes'
        .filter_map(|line| {
            let line = line.trim().trim_end_matches([',', ';']);
            let mut parts = line.split_whitespace();
            let id = parts.next()?.to_string();
            let label = parts.next()?.trim_matches('\'').to_string();
            Some((id, label))
        })
        .collect::<HashMap<_, _>>()
}

fn rename_leaf_nodes(tree: &mut Tree, translate: &HashMap<String, String>) {
    for leaf_id in tree.get_leaves() {
        if let Ok(node) = tree.get_mut(&leaf_id) {
            if let Some(label) = node.name.as_ref().and_then(|n| translate.get(n)) {
                node.name = Some(label.clone());
            }
        }
    }
}

/// Leaf names of `tree`, sorted alphabetically.
///
/// # Errors
/// [`ClusterError::UnnamedLeaf`] if a leaf has no name.
pub fn leaf_names(tree: &Tree) -> Result<Vec<String>> {
    let mut names = tree
        .get_leaves()
        .into_iter()
        .map(|id| tree.get(&id)?.name.clone().ok_or(ClusterError::UnnamedLeaf { node: id }))
        .collect::<Result<Vec<_>>>()?;
    names.sort();
    Ok(names)
}

/// Read taxon names, one per non-empty line.
pub fn read_names<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for line in open_lines(path)?.lines() {
        let line = line?;
        let name = line.trim();
        if !name.is_empty() {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

/// Read a PP table of `name_a<TAB>name_b<TAB>pp` lines into a symmetric N×N matrix.
///
/// Blank lines and `#` comments are skipped, as is a first line whose third
/// column is not a number (a header). Entries never listed stay NaN; every pair
/// in `required` must be present.
///
/// # Errors
/// - [`ClusterError::Parse`] for malformed lines or unknown names
/// - [`ClusterError::MissingProbability`] for a required pair without a value
pub fn read_pp_table<P: AsRef<Path>>(path: P, names: &[String], required: &[Pair]) -> Result<SquareMatrix> {
    let index: HashMap<&str, usize> = names.iter().enumerate().map(|(i, n)| (n.as_str(), i)).collect();
    let mut pp = SquareMatrix::filled(names.len(), f64::NAN);
    let mut first_data_line = true;

    for (lineno, line) in open_lines(path)?.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let parse_err = |message: String| ClusterError::Parse { line: lineno + 1, message };
        let may_be_header = std::mem::replace(&mut first_data_line, false);

        let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
        let [a, b, value] = fields[..] else {
            return Err(parse_err(format!("expected 3 tab-separated columns, found {}", fields.len())));
        };
        let value: f64 = match value.parse() {
            Ok(v) => v,
            Err(_) if may_be_header => continue,
            Err(e) => return Err(parse_err(format!("invalid probability `{value}`: {e}"))),
        };
        let lookup = |name: &str| {
            index
                .get(name)
                .copied()
                .ok_or_else(|| parse_err(format!("unknown taxon `{name}`")))
        };
        let (i, j) = (lookup(a)?, lookup(b)?);
        pp.set_symmetric(i, j, value);
    }

    if let Some(missing) = required.iter().find(|p| pp.get(p.first, p.second).is_nan()) {
        return Err(ClusterError::MissingProbability {
            first: names[missing.first].clone(),
            second: names[missing.second].clone(),
        });
    }
    Ok(pp)
}

/// Write the pairs to calculate as `name_i<TAB>name_j` lines.
pub fn write_pairs_tsv<P: AsRef<Path>>(path: P, names: &[String], pairs: &[Pair]) -> io::Result<()> {
    with_writer(path, |out| {
        for p in pairs {
            writeln!(out, "{}\t{}", names[p.first], names[p.second])?;
        }
        Ok(())
    })
}

/// Write one tab-separated group of names per line.
pub fn write_clusters<P: AsRef<Path>>(path: P, names: &[String], partition: &Partition) -> io::Result<()> {
    with_writer(path, |out| {
        for group in partition.named(names) {
            writeln!(out, "{}", group.join("\t"))?;
        }
        Ok(())
    })
}
