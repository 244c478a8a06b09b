use super::{BoundingBox, Point, RecognizedToken};

/// Smallest box enclosing every token. `None` for an empty slice.
pub fn bounding_box(tokens: &[RecognizedToken]) -> Option<BoundingBox> {
    let (first, rest) = tokens.split_first()?;
    Some(enclosing_box(first, rest))
}

/// Box enclosing `first` and every token in `rest`.
pub fn enclosing_box(first: &RecognizedToken, rest: &[RecognizedToken]) -> BoundingBox {
    rest.iter().fold(token_bbox(first), |bbox, token| {
        union_bbox(&bbox, &token_bbox(token))
    })
}

fn token_bbox(token: &RecognizedToken) -> BoundingBox {
    BoundingBox {
        top_left: Point {
            x: token.left,
            y: token.top,
        },
        bottom_right: Point {
            x: token.right(),
            y: token.bottom(),
        },
    }
}

fn union_bbox(a: &BoundingBox, b: &BoundingBox) -> BoundingBox {
    BoundingBox {
        top_left: Point {
            x: a.top_left.x.min(b.top_left.x),
            y: a.top_left.y.min(b.top_left.y),
        },
        bottom_right: Point {
            x: a.bottom_right.x.max(b.bottom_right.x),
            y: a.bottom_right.y.max(b.bottom_right.y),
        },
    }
}
