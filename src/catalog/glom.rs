//! Grouping of scalar result variables into multi-component arrays.
//!
//! Exodus stores every component of a vector or tensor as its own scalar
//! variable (`disp_x`, `disp_y`, `disp_z`). [`glom_variables`] scans the
//! ordered name list with a fixed set of checkers. At each start index every
//! checker is started, then all checkers still accepting are offered the
//! following names one at a time. The longest complete match wins; ties go to
//! the checker registered first, so the scalar checker is the fallback.
//!
//! A checker only extends its run with a variable whose truth row equals the
//! row of the variables it already holds, so every glommed array is defined
//! on exactly the objects where all of its components are.

use once_cell::sync::Lazy;
use regex::Regex;

/// How an array was formed from its scalar parts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GlomKind {
    Scalar,
    Vector2,
    Vector3,
    /// `r`, `z` components.
    Cylindrical,
    SymmetricTensor,
    IntegrationPoint,
}

/// A logical array after glomming.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArrayInfo {
    pub name: String,
    pub components: usize,
    pub glom: GlomKind,
    /// Scalar variable names in component order.
    pub original_names: Vec<String>,
    /// 0-based variable indices in component order.
    pub original_indices: Vec<usize>,
    /// Per object of the owning collection: is the array stored there.
    pub object_truth: Vec<bool>,
    /// Selected for output.
    pub status: bool,
}

/// One recogniser in the glomming race.
trait GlomChecker {
    /// Resets state and tries `name` as the first component. Returns true if
    /// more names may be offered.
    fn start(&mut self, name: &str, truth: &[bool]) -> bool;
    /// Offers the next name. Returns true if still more names may be offered.
    fn add(&mut self, name: &str, truth: &[bool]) -> bool;
    /// Number of names consumed by a complete match, zero otherwise.
    fn length(&self) -> usize;
    /// Array name and kind for a complete match.
    fn accept(&self) -> (String, GlomKind);
}

struct ScalarCheck {
    name: String,
}

impl GlomChecker for ScalarCheck {
    fn start(&mut self, name: &str, _truth: &[bool]) -> bool {
        self.name = name.to_string();
        false
    }

    fn add(&mut self, _name: &str, _truth: &[bool]) -> bool {
        false
    }

    fn length(&self) -> usize {
        1
    }

    fn accept(&self) -> (String, GlomKind) {
        (self.name.clone(), GlomKind::Scalar)
    }
}

/// Matches a run of names sharing a prefix and ending in consecutive
/// `rank`-character slices of `endings`.
struct SuffixCheck {
    endings: &'static str,
    components: usize,
    rank: usize,
    kind: GlomKind,
    prefix: String,
    seen: usize,
    truth: Vec<bool>,
    open: bool,
}

impl SuffixCheck {
    fn new(endings: &'static str, components: usize, rank: usize, kind: GlomKind) -> Self {
        debug_assert_eq!(endings.len(), components * rank);
        Self {
            endings,
            components,
            rank,
            kind,
            prefix: String::new(),
            seen: 0,
            truth: Vec::new(),
            open: false,
        }
    }

    fn ending(&self, component: usize) -> &'static str {
        &self.endings[component * self.rank..(component + 1) * self.rank]
    }

    /// Splits `name` into prefix and a `rank`-byte suffix.
    fn split<'a>(&self, name: &'a str) -> Option<(&'a str, &'a str)> {
        if name.len() <= self.rank {
            return None;
        }
        let cut = name.len() - self.rank;
        if !name.is_char_boundary(cut) {
            return None;
        }
        Some(name.split_at(cut))
    }
}

impl GlomChecker for SuffixCheck {
    fn start(&mut self, name: &str, truth: &[bool]) -> bool {
        self.seen = 0;
        self.open = false;
        let Some((prefix, suffix)) = self.split(name) else {
            return false;
        };
        if !suffix.eq_ignore_ascii_case(self.ending(0)) {
            return false;
        }
        self.prefix = prefix.to_string();
        self.truth = truth.to_vec();
        self.seen = 1;
        self.open = self.seen < self.components;
        self.open
    }

    fn add(&mut self, name: &str, truth: &[bool]) -> bool {
        if !self.open {
            return false;
        }
        let extends = match self.split(name) {
            Some((prefix, suffix)) => {
                prefix == self.prefix
                    && suffix.eq_ignore_ascii_case(self.ending(self.seen))
                    && truth == self.truth.as_slice()
            }
            None => false,
        };
        if !extends {
            self.open = false;
            return false;
        }
        self.seen += 1;
        self.open = self.seen < self.components;
        self.open
    }

    fn length(&self) -> usize {
        if self.seen == self.components {
            self.components
        } else {
            0
        }
    }

    fn accept(&self) -> (String, GlomKind) {
        let trimmed = self.prefix.strip_suffix('_').unwrap_or(&self.prefix);
        let name = if trimmed.is_empty() {
            self.prefix.clone()
        } else {
            trimmed.to_string()
        };
        (name, self.kind)
    }
}

static INTEGRATION_POINT: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^(.+)_([A-Za-z]+)([0-9]+)$").ok());

const INTEGRATION_SHAPES: [&str; 6] = ["QUAD", "TRI", "HEX", "TET", "WEDGE", "PYR"];

/// Matches `<prefix>_<SHAPE><n>` with `n` running 1, 2, 3, ...
struct IntegrationPointCheck {
    prefix: String,
    shape: String,
    count: usize,
    truth: Vec<bool>,
    open: bool,
}

impl IntegrationPointCheck {
    fn new() -> Self {
        Self {
            prefix: String::new(),
            shape: String::new(),
            count: 0,
            truth: Vec::new(),
            open: false,
        }
    }

    fn parse(name: &str) -> Option<(&str, String, usize)> {
        let caps = INTEGRATION_POINT.as_ref()?.captures(name)?;
        let prefix = caps.get(1)?.as_str();
        let shape = caps.get(2)?.as_str().to_ascii_uppercase();
        let index = caps.get(3)?.as_str().parse().ok()?;
        Some((prefix, shape, index))
    }

    /// Point counts must tile the reference cell.
    fn plausible(shape: &str, count: usize) -> bool {
        let root = |p: u32| (1..=count).any(|k| k.checked_pow(p) == Some(count));
        match shape {
            "QUAD" => root(2),
            "HEX" => root(3),
            _ => true,
        }
    }
}

impl GlomChecker for IntegrationPointCheck {
    fn start(&mut self, name: &str, truth: &[bool]) -> bool {
        self.count = 0;
        self.open = false;
        let Some((prefix, shape, index)) = Self::parse(name) else {
            return false;
        };
        if index != 1 || !INTEGRATION_SHAPES.contains(&shape.as_str()) {
            return false;
        }
        self.prefix = prefix.to_string();
        self.shape = shape;
        self.truth = truth.to_vec();
        self.count = 1;
        self.open = true;
        true
    }

    fn add(&mut self, name: &str, truth: &[bool]) -> bool {
        if !self.open {
            return false;
        }
        let extends = Self::parse(name).is_some_and(|(prefix, shape, index)| {
            prefix == self.prefix
                && shape == self.shape
                && index == self.count + 1
                && truth == self.truth.as_slice()
        });
        if extends {
            self.count += 1;
        } else {
            self.open = false;
        }
        self.open
    }

    fn length(&self) -> usize {
        if self.count >= 2 && Self::plausible(&self.shape, self.count) {
            self.count
        } else {
            0
        }
    }

    fn accept(&self) -> (String, GlomKind) {
        (self.prefix.clone(), GlomKind::IntegrationPoint)
    }
}

fn checkers() -> Vec<Box<dyn GlomChecker>> {
    vec![
        Box::new(ScalarCheck {
            name: String::new(),
        }),
        Box::new(SuffixCheck::new("xy", 2, 1, GlomKind::Vector2)),
        Box::new(SuffixCheck::new("xYz", 3, 1, GlomKind::Vector3)),
        Box::new(SuffixCheck::new("RZ", 2, 1, GlomKind::Cylindrical)),
        Box::new(SuffixCheck::new(
            "XXYYZZXYXZYZ",
            6,
            2,
            GlomKind::SymmetricTensor,
        )),
        Box::new(SuffixCheck::new(
            "XXXYYYZZZWWWXXYXXZXXWXYYXYZXYWXZZXZWXWWYYZYYWYZZYZWYWWZZWZWW",
            20,
            3,
            GlomKind::SymmetricTensor,
        )),
        Box::new(IntegrationPointCheck::new()),
    ]
}

/// Strips surrounding blanks and control characters; blank names become
/// `null_<index>`.
pub fn clean_name(raw: &str, index: usize) -> String {
    let trimmed = raw.trim_matches(|c: char| c.is_whitespace() || c.is_control() || c == '\0');
    if trimmed.is_empty() {
        format!("null_{index}")
    } else {
        trimmed.to_string()
    }
}

/// Returns `base`, or `base_<n>` for the smallest `n` not yet taken.
pub fn unique_name(base: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }
    (1usize..)
        .map(|n| format!("{base}_{n}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_string())
}

/// Groups variables into arrays.
///
/// `truth` holds one row per object and one column per variable. Rows shorter
/// than `names` count as false for the missing variables. Names are unique
/// within one variable type only.
pub fn glom_variables(names: &[String], truth: &[Vec<bool>]) -> Vec<ArrayInfo> {
    let names: Vec<String> = names
        .iter()
        .enumerate()
        .map(|(i, n)| clean_name(n, i))
        .collect();
    let column = |var: usize| -> Vec<bool> {
        truth
            .iter()
            .map(|row| row.get(var).copied().unwrap_or(false))
            .collect()
    };

    let mut checkers = checkers();
    let mut out: Vec<ArrayInfo> = Vec::new();
    let mut i = 0;
    while i < names.len() {
        let first_truth = column(i);
        let mut open: Vec<bool> = checkers
            .iter_mut()
            .map(|c| c.start(&names[i], &first_truth))
            .collect();

        let mut j = i + 1;
        while j < names.len() && open.iter().any(|&o| o) {
            let truth_j = column(j);
            for (checker, still_open) in checkers.iter_mut().zip(open.iter_mut()) {
                if *still_open {
                    *still_open = checker.add(&names[j], &truth_j);
                }
            }
            j += 1;
        }

        let mut best = 0;
        for (c, checker) in checkers.iter().enumerate().skip(1) {
            if checker.length() > checkers[best].length() {
                best = c;
            }
        }
        let len = checkers[best].length().max(1);
        let (base, glom) = checkers[best].accept();
        let name = unique_name(&base, |candidate| {
            out.iter().any(|a| a.name == candidate)
        });

        out.push(ArrayInfo {
            name,
            components: len,
            glom,
            original_names: names[i..i + len].to_vec(),
            original_indices: (i..i + len).collect(),
            object_truth: first_truth,
            status: false,
        });
        i += len;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn full_truth(objects: usize, vars: usize) -> Vec<Vec<bool>> {
        vec![vec![true; vars]; objects]
    }

    #[test]
    fn three_vector_from_common_prefix() {
        let n = names(&["disp_x", "disp_y", "disp_z", "temp"]);
        let arrays = glom_variables(&n, &full_truth(2, 4));
        assert_eq!(arrays.len(), 2);
        assert_eq!(arrays[0].name, "disp");
        assert_eq!(arrays[0].components, 3);
        assert_eq!(arrays[0].glom, GlomKind::Vector3);
        assert_eq!(arrays[0].original_indices, vec![0, 1, 2]);
        assert_eq!(arrays[1].name, "temp");
        assert_eq!(arrays[1].glom, GlomKind::Scalar);
    }

    #[test]
    fn two_vector_when_z_missing() {
        let n = names(&["VelX", "VelY", "p"]);
        let arrays = glom_variables(&n, &full_truth(1, 3));
        assert_eq!(arrays[0].name, "Vel");
        assert_eq!(arrays[0].glom, GlomKind::Vector2);
        assert_eq!(arrays[1].name, "p");
    }

    #[test]
    fn differing_truth_splits_vector() {
        let n = names(&["u_x", "u_y", "u_z"]);
        let truth = vec![vec![true, true, false], vec![true, true, true]];
        let arrays = glom_variables(&n, &truth);
        assert_eq!(arrays.len(), 2);
        assert_eq!(arrays[0].components, 2);
        assert_eq!(arrays[0].object_truth, vec![true, true]);
        assert_eq!(arrays[1].name, "u_z");
        assert_eq!(arrays[1].object_truth, vec![false, true]);
    }

    #[test]
    fn symmetric_tensor_and_cylindrical() {
        let n = names(&[
            "stress_xx", "stress_yy", "stress_zz", "stress_xy", "stress_xz", "stress_yz", "vr",
            "vz",
        ]);
        let arrays = glom_variables(&n, &full_truth(1, 8));
        assert_eq!(arrays.len(), 2);
        assert_eq!(arrays[0].name, "stress");
        assert_eq!(arrays[0].components, 6);
        assert_eq!(arrays[0].glom, GlomKind::SymmetricTensor);
        assert_eq!(arrays[1].name, "v");
        assert_eq!(arrays[1].glom, GlomKind::Cylindrical);
    }

    #[test]
    fn integration_points() {
        let n = names(&["eps_QUAD1", "eps_QUAD2", "eps_QUAD3", "eps_QUAD4", "eps_QUAD1"]);
        let arrays = glom_variables(&n, &full_truth(1, 5));
        assert_eq!(arrays[0].name, "eps");
        assert_eq!(arrays[0].components, 4);
        assert_eq!(arrays[0].glom, GlomKind::IntegrationPoint);
        assert_eq!(arrays[1].name, "eps_QUAD1");
    }

    #[test]
    fn three_quad_points_are_not_a_tiling() {
        let n = names(&["e_QUAD1", "e_QUAD2", "e_QUAD3"]);
        let arrays = glom_variables(&n, &full_truth(1, 3));
        assert_eq!(arrays.len(), 3);
    }

    #[test]
    fn names_are_cleaned_and_uniquified() {
        let n = names(&[" temp ", "", "temp", "null_1"]);
        let arrays = glom_variables(&n, &full_truth(1, 4));
        let got: Vec<_> = arrays.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(got, ["temp", "null_1", "temp_1", "null_1_1"]);
    }

    #[test]
    fn glomming_is_deterministic() {
        let n = names(&["a_x", "a_y", "a_z", "b", "c_r", "c_z"]);
        let t = full_truth(3, 6);
        assert_eq!(glom_variables(&n, &t), glom_variables(&n, &t));
    }
}
