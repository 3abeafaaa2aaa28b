//! SVG figures: concentration pies, the truncated dendrogram and elbow curves.

use std::path::Path;

use plotters::{
    element::Pie,
    prelude::*,
    style::text_anchor::{HPos, Pos, VPos},
};
use posclust_analysis::concentration::ConcentrationTable;
use posclust_cluster::MergeTree;

const PANEL_SIZE: (u32, u32) = (320, 420);
const FIGURE_SIZE: (u32, u32) = (1000, 600);
/// Merge levels shown below the root of the dendrogram.
pub const DENDROGRAM_DEPTH: usize = 3;

const PALETTE: [RGBColor; 5] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
];

fn category_color(index: usize) -> RGBColor {
    PALETTE[index % PALETTE.len()]
}

/// One pie per cluster, side by side, each with its own legend.
#[expect(clippy::cast_possible_truncation)]
pub fn draw_concentration_pies(
    path: &Path,
    title: &str,
    table: &ConcentrationTable,
) -> anyhow::Result<()> {
    let k = table.rows().len().max(1);
    let size = (PANEL_SIZE.0 * k as u32, PANEL_SIZE.1 + 40);
    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled(title, ("sans-serif", 24))?;

    let panels = root.split_evenly((1, k));
    for ((panel, row), fractions) in panels.iter().zip(table.rows()).zip(table.rounded(3)) {
        let panel = panel.titled(
            &format!("Cluster {} (n = {})", row.cluster, row.total),
            ("sans-serif", 16),
        )?;
        draw_pie(&panel, &fractions, table.categories())?;
    }

    root.present()?;
    Ok(())
}

/// Non-empty wedges with their category colors.
///
/// Empty wedges would stack their percentage labels on top of each other.
fn pie_slices(fractions: &[f64]) -> (Vec<f64>, Vec<RGBColor>) {
    fractions
        .iter()
        .enumerate()
        .filter(|(_, f)| **f > 0.0)
        .map(|(i, &f)| (f, category_color(i)))
        .unzip()
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]
fn draw_pie<DB>(
    area: &DrawingArea<DB, plotters::coord::Shift>,
    fractions: &[f64],
    categories: &[String],
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>>
where
    DB: DrawingBackend,
{
    let (width, height) = area.dim_in_pixel();
    let legend_height = 18 * categories.len() as u32 + 10;
    let radius = f64::from(width.min(height.saturating_sub(legend_height))) * 0.36;
    let center = (width as i32 / 2, (radius * 1.2) as i32);

    let (sizes, colors) = pie_slices(fractions);
    if !sizes.is_empty() {
        let labels = vec![""; sizes.len()];
        let mut pie = Pie::new(&center, &radius, &sizes, &colors, labels.as_slice());
        // clockwise from twelve o'clock
        pie.start_angle(-90.0);
        pie.percentages(("sans-serif", 12).into_font().color(&WHITE));
        area.draw(&pie)?;
    }

    let legend_top = center.1 + radius as i32 + 12;
    for (i, (category, fraction)) in categories.iter().zip(fractions).enumerate() {
        let y = legend_top + 18 * i as i32;
        area.draw(&Rectangle::new(
            [(20, y), (32, y + 12)],
            category_color(i).filled(),
        ))?;
        area.draw(&Text::new(
            format!("{category}: {fraction:.3}"),
            (40, y),
            ("sans-serif", 13).into_font(),
        ))?;
    }
    Ok(())
}

/// Position of a displayed dendrogram node.
#[derive(Debug, Clone, Copy, PartialEq)]
struct NodePosition {
    x: f64,
    height: f64,
}

/// Leaves and links of a dendrogram truncated to `depth` merge levels.
#[derive(Debug, Clone, Default, PartialEq)]
struct DendrogramLayout {
    /// `(x, label)` of each displayed leaf, left to right.
    leaves: Vec<(f64, String)>,
    /// U-shaped links as `[left bottom, left top, right top, right bottom]`.
    links: Vec<[(f64, f64); 4]>,
}

impl DendrogramLayout {
    fn new(tree: &MergeTree, depth: usize) -> Self {
        let mut layout = Self::default();
        if tree.n_leaves() > 0 {
            layout.place(tree, tree.root(), depth);
        }
        layout
    }

    #[expect(clippy::cast_precision_loss)]
    fn place(&mut self, tree: &MergeTree, node: usize, depth: usize) -> NodePosition {
        let children = tree.children(node).filter(|_| depth > 0);
        let Some((left, right)) = children else {
            let x = self.leaves.len() as f64 + 0.5;
            let label = if tree.is_leaf(node) {
                node.to_string()
            } else {
                format!("({})", tree.size(node))
            };
            self.leaves.push((x, label));
            return NodePosition {
                x,
                height: tree.height(node),
            };
        };

        let l = self.place(tree, left, depth - 1);
        let r = self.place(tree, right, depth - 1);
        let height = tree.height(node);
        self.links
            .push([(l.x, l.height), (l.x, height), (r.x, height), (r.x, r.height)]);
        NodePosition {
            x: (l.x + r.x) / 2.0,
            height,
        }
    }
}

/// Ward dendrogram showing the top [`DENDROGRAM_DEPTH`] merge levels;
/// collapsed subtrees are labeled with their size in parentheses.
///
/// `cut` draws the height at which the tree splits into the requested
/// number of clusters.
#[expect(clippy::cast_precision_loss)]
pub fn draw_dendrogram(
    path: &Path,
    title: &str,
    tree: &MergeTree,
    cut: Option<Threshold<'_>>,
) -> anyhow::Result<()> {
    let layout = DendrogramLayout::new(tree, DENDROGRAM_DEPTH);
    let width = layout.leaves.len() as f64;
    let top = tree
        .height(tree.root())
        .max(cut.map_or(0.0, |c| c.value))
        .max(f64::MIN_POSITIVE)
        * 1.05;

    let root = SVGBackend::new(path, FIGURE_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(10)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..width, -top * 0.08..top)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_x_axis()
        .y_desc("Ward distance")
        .draw()?;

    chart.draw_series(
        layout
            .links
            .iter()
            .map(|link| PathElement::new(link.to_vec(), BLUE.stroke_width(2))),
    )?;
    chart.draw_series(layout.leaves.iter().map(|(x, label)| {
        Text::new(
            label.clone(),
            (*x, -top * 0.01),
            ("sans-serif", 13)
                .into_font()
                .color(&BLACK)
                .pos(Pos::new(HPos::Center, VPos::Top)),
        )
    }))?;

    if let Some(cut) = cut {
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(0.0, cut.value), (width, cut.value)],
                RED.mix(0.7).stroke_width(2),
            )))?
            .label(cut.label)
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }

    root.present()?;
    Ok(())
}

/// Horizontal reference line drawn across a curve plot.
#[derive(Debug, Clone, Copy)]
pub struct Threshold<'a> {
    pub value: f64,
    pub label: &'a str,
}

/// Line plot with point markers, such as an elbow curve.
#[expect(clippy::cast_precision_loss)]
pub fn draw_curve(
    path: &Path,
    title: &str,
    axes: [&str; 2],
    points: &[(usize, f64)],
    threshold: Option<Threshold<'_>>,
) -> anyhow::Result<()> {
    let x_min = points.iter().map(|p| p.0).min().unwrap_or(0) as f64;
    let x_max = points.iter().map(|p| p.0).max().unwrap_or(1) as f64;
    let y_max = points
        .iter()
        .map(|p| p.1)
        .chain(threshold.map(|t| t.value))
        .fold(0.0, f64::max)
        .max(f64::MIN_POSITIVE);

    let root = SVGBackend::new(path, FIGURE_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d((x_min - 0.5)..(x_max + 0.5), 0.0..y_max * 1.05)?;
    chart
        .configure_mesh()
        .x_desc(axes[0])
        .y_desc(axes[1])
        .draw()?;

    let line = points.iter().map(|&(x, y)| (x as f64, y));
    chart.draw_series(LineSeries::new(line.clone(), BLUE))?;
    chart.draw_series(line.map(|p| Circle::new(p, 3, BLUE.filled())))?;

    if let Some(threshold) = threshold {
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(x_min - 0.5, threshold.value), (x_max + 0.5, threshold.value)],
                RED.mix(0.7).stroke_width(2),
            )))?
            .label(threshold.label)
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use ndarray::array;
    use posclust_cluster::WardClustering;

    use super::*;

    #[test]
    fn test_pie_slices_skip_empty_wedges() {
        let (sizes, colors) = pie_slices(&[0.5, 0.0, 0.25, 0.25, 0.0]);
        assert_eq!(sizes, [0.5, 0.25, 0.25]);
        assert_eq!(colors, [PALETTE[0], PALETTE[2], PALETTE[3]]);
    }

    #[test]
    fn test_small_tree_is_fully_expanded() {
        let data = array![[0.0], [0.1], [5.0]];
        let tree = WardClustering::new(2).fit_tree(data.view()).unwrap();
        let layout = DendrogramLayout::new(&tree, DENDROGRAM_DEPTH);

        let labels = layout
            .leaves
            .iter()
            .map(|(_, label)| label.as_str())
            .collect::<Vec<_>>();
        assert_eq!(labels.len(), 3);
        assert!(labels.iter().all(|l| l.parse::<usize>().is_ok()));
        assert_eq!(layout.links.len(), 2);
    }

    #[test]
    fn test_deep_tree_is_truncated() {
        let data = array![
            [0.0],
            [1.0],
            [3.0],
            [7.0],
            [15.0],
            [31.0],
            [63.0],
            [127.0],
            [255.0],
            [511.0]
        ];
        let tree = WardClustering::new(2).fit_tree(data.view()).unwrap();
        let layout = DendrogramLayout::new(&tree, 1);

        assert_eq!(layout.leaves.len(), 2);
        assert_eq!(layout.links.len(), 1);
        let total = layout
            .leaves
            .iter()
            .map(|(_, label)| {
                match label.strip_prefix('(').and_then(|l| l.strip_suffix(')')) {
                    Some(size) => size.parse::<usize>().unwrap(),
                    None => 1,
                }
            })
            .sum::<usize>();
        assert_eq!(total, 10);
        for [bottom_left, top_left, top_right, bottom_right] in &layout.links {
            assert!(bottom_left.1 <= top_left.1);
            assert_eq!(top_left.1, top_right.1);
            assert!(bottom_right.1 <= top_right.1);
        }
    }
}
