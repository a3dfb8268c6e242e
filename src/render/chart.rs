//! DrawingML chart parts.
//!
//! Values are written as literals (`c:strLit` / `c:numLit`) so the chart
//! renders without an embedded workbook. Bar charts are clustered columns;
//! pie charts plot the first series only and colour each slice.

use crate::outline::{ChartData, ChartShape, Series};
use crate::render::xml::{escape, NS_A, NS_C, NS_R, XML_DECL};
use crate::theme::Theme;

const CAT_AX_ID: u32 = 500_000_001;
const VAL_AX_ID: u32 = 500_000_002;

/// Serialize `chart` as a standalone `chartN.xml` part.
pub fn chart_xml(chart: &ChartData, theme: &Theme) -> String {
    let palette = theme.series_palette();
    let mut plot = String::with_capacity(2048);

    match chart.shape {
        ChartShape::Bar => {
            plot.push_str(r#"<c:barChart><c:barDir val="col"/><c:grouping val="clustered"/><c:varyColors val="0"/>"#);
            for (i, s) in chart.series.iter().enumerate() {
                let color = palette[i % palette.len()];
                plot.push_str(&series_open(i, s));
                plot.push_str(&format!(
                    r#"<c:spPr><a:solidFill><a:srgbClr val="{color}"/></a:solidFill></c:spPr><c:invertIfNegative val="0"/>"#
                ));
                plot.push_str(&series_data(&chart.categories, s));
                plot.push_str("</c:ser>");
            }
            plot.push_str(&format!(
                r#"<c:gapWidth val="150"/><c:axId val="{CAT_AX_ID}"/><c:axId val="{VAL_AX_ID}"/></c:barChart>"#
            ));
            plot.push_str(&axes(theme));
        }
        ChartShape::Line => {
            plot.push_str(r#"<c:lineChart><c:grouping val="standard"/><c:varyColors val="0"/>"#);
            for (i, s) in chart.series.iter().enumerate() {
                let color = palette[i % palette.len()];
                plot.push_str(&series_open(i, s));
                plot.push_str(&format!(
                    r#"<c:spPr><a:ln w="28575" cap="rnd"><a:solidFill><a:srgbClr val="{color}"/></a:solidFill><a:round/></a:ln></c:spPr><c:marker><c:symbol val="circle"/><c:size val="6"/><c:spPr><a:solidFill><a:srgbClr val="{color}"/></a:solidFill></c:spPr></c:marker>"#
                ));
                plot.push_str(&series_data(&chart.categories, s));
                plot.push_str(r#"<c:smooth val="0"/></c:ser>"#);
            }
            plot.push_str(&format!(
                r#"<c:marker val="1"/><c:axId val="{CAT_AX_ID}"/><c:axId val="{VAL_AX_ID}"/></c:lineChart>"#
            ));
            plot.push_str(&axes(theme));
        }
        ChartShape::Pie => {
            plot.push_str(r#"<c:pieChart><c:varyColors val="1"/>"#);
            if let Some(s) = chart.series.first() {
                plot.push_str(&series_open(0, s));
                for idx in 0..chart.categories.len() {
                    let color = palette[idx % palette.len()];
                    plot.push_str(&format!(
                        r#"<c:dPt><c:idx val="{idx}"/><c:bubble3D val="0"/><c:spPr><a:solidFill><a:srgbClr val="{color}"/></a:solidFill><a:ln><a:solidFill><a:srgbClr val="{}"/></a:solidFill></a:ln></c:spPr></c:dPt>"#,
                        theme.background
                    ));
                }
                plot.push_str(r#"<c:dLbls><c:showLegendKey val="0"/><c:showVal val="0"/><c:showCatName val="0"/><c:showSerName val="0"/><c:showPercent val="1"/><c:showBubbleSize val="0"/><c:showLeaderLines val="1"/></c:dLbls>"#);
                plot.push_str(&series_data(&chart.categories, s));
                plot.push_str("</c:ser>");
            }
            plot.push_str(r#"<c:firstSliceAng val="0"/></c:pieChart>"#);
        }
    }

    let legend_pos = if chart.shape == ChartShape::Pie { "r" } else { "b" };
    format!(
        r#"{XML_DECL}<c:chartSpace xmlns:c="{NS_C}" xmlns:a="{NS_A}" xmlns:r="{NS_R}"><c:roundedCorners val="0"/><c:chart><c:autoTitleDeleted val="1"/><c:plotArea><c:layout/>{plot}</c:plotArea><c:legend><c:legendPos val="{legend_pos}"/><c:overlay val="0"/></c:legend><c:plotVisOnly val="1"/><c:dispBlanksAs val="gap"/></c:chart><c:spPr><a:noFill/><a:ln><a:noFill/></a:ln></c:spPr>{}</c:chartSpace>"#,
        text_props(theme)
    )
}

fn series_open(i: usize, s: &Series) -> String {
    format!(
        r#"<c:ser><c:idx val="{i}"/><c:order val="{i}"/><c:tx><c:v>{}</c:v></c:tx>"#,
        escape(&s.name)
    )
}

fn series_data(categories: &[String], s: &Series) -> String {
    let mut x = format!(
        r#"<c:cat><c:strLit><c:ptCount val="{}"/>"#,
        categories.len()
    );
    for (i, c) in categories.iter().enumerate() {
        x.push_str(&format!(r#"<c:pt idx="{i}"><c:v>{}</c:v></c:pt>"#, escape(c)));
    }
    x.push_str("</c:strLit></c:cat>");
    x.push_str(&format!(
        r#"<c:val><c:numLit><c:formatCode>General</c:formatCode><c:ptCount val="{}"/>"#,
        s.values.len()
    ));
    for (i, v) in s.values.iter().enumerate() {
        x.push_str(&format!(r#"<c:pt idx="{i}"><c:v>{v}</c:v></c:pt>"#));
    }
    x.push_str("</c:numLit></c:val>");
    x
}

fn axes(theme: &Theme) -> String {
    let grid = super::layout::blend(theme.background, theme.text, 0.15);
    format!(
        r#"<c:catAx><c:axId val="{CAT_AX_ID}"/><c:scaling><c:orientation val="minMax"/></c:scaling><c:delete val="0"/><c:axPos val="b"/><c:numFmt formatCode="General" sourceLinked="0"/><c:majorTickMark val="none"/><c:minorTickMark val="none"/><c:tickLblPos val="nextTo"/><c:crossAx val="{VAL_AX_ID}"/><c:crosses val="autoZero"/><c:auto val="1"/><c:lblAlgn val="ctr"/><c:lblOffset val="100"/><c:noMultiLvlLbl val="0"/></c:catAx><c:valAx><c:axId val="{VAL_AX_ID}"/><c:scaling><c:orientation val="minMax"/></c:scaling><c:delete val="0"/><c:axPos val="l"/><c:majorGridlines><c:spPr><a:ln w="9525"><a:solidFill><a:srgbClr val="{grid}"/></a:solidFill></a:ln></c:spPr></c:majorGridlines><c:numFmt formatCode="General" sourceLinked="0"/><c:majorTickMark val="none"/><c:minorTickMark val="none"/><c:tickLblPos val="nextTo"/><c:crossAx val="{CAT_AX_ID}"/><c:crosses val="autoZero"/><c:crossBetween val="between"/></c:valAx>"#
    )
}

fn text_props(theme: &Theme) -> String {
    format!(
        r#"<c:txPr><a:bodyPr/><a:lstStyle/><a:p><a:pPr><a:defRPr sz="1400"><a:solidFill><a:srgbClr val="{}"/></a:solidFill><a:latin typeface="{}"/></a:defRPr></a:pPr><a:endParaRPr lang="en-US"/></a:p></c:txPr>"#,
        theme.text,
        escape(theme.body_font)
    )
}
