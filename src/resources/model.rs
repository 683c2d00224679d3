//! Model decoder.
//!
//! A model is a stream of polygon records with no length prefix: it ends at
//! the record flagged "last", and a model whose first word is zero is empty.
//! The same decoder serves Model RAM (little-endian) and Model ROM
//! (big-endian); only the word accessor differs.

use crate::{
    data_structures::{
        atlas::Atlas,
        memory::{Endian, RegionView},
        numeric::fixed_13_19,
        polygon::{
            HEADER_BYTES, HEADER_WORDS, PolygonHeader, ReuseSlots, Shape, VERTEX_BYTES, Vertex,
        },
    },
    error::DecodeError,
    render::{Primitive, PrimitiveKind, PrimitiveVertex},
};

/// One decoded polygon with its carried and explicit vertices in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub header: PolygonHeader,
    pub vertices: Vec<Vertex>,
}

impl Polygon {
    /// Builds the backend primitive, looking the texture up in `atlas` by the
    /// polygon's texture origin.
    pub fn to_primitive(&self, atlas: &Atlas) -> Primitive {
        let header = &self.header;
        let kind = match header.shape {
            Shape::Triangle => PrimitiveKind::Triangle,
            Shape::Quad => PrimitiveKind::Quad,
        };
        let texture = if header.textured {
            atlas.handle_for_base(header.base_u, header.base_v)
        } else {
            None
        };
        Primitive {
            kind,
            color: header.color,
            texture,
            vertices: self
                .vertices
                .iter()
                .map(|v| PrimitiveVertex {
                    position: v.position,
                    tex_coords: v.tex_coords(header.tex_width, header.tex_height),
                })
                .collect(),
        }
    }
}

/// Iterator over the polygons of one model.
///
/// Yields at most one error, after which it is exhausted. Exceeding
/// `max_polygons` without seeing the last-polygon flag yields
/// [`DecodeError::StreamOverrun`].
pub struct ModelStream<'m> {
    view: RegionView<'m>,
    offset: usize,
    endian: Endian,
    slots: ReuseSlots,
    decoded: usize,
    max_polygons: usize,
    done: bool,
}

impl<'m> ModelStream<'m> {
    /// Opens the model at `offset`, picking the byte order of its region.
    pub fn new(view: RegionView<'m>, offset: usize, max_polygons: usize) -> Self {
        Self {
            endian: Endian::for_models_in(view.region()),
            view,
            offset,
            slots: ReuseSlots::default(),
            decoded: 0,
            max_polygons,
            done: false,
        }
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    fn read_vertex(&self, offset: usize) -> Result<Vertex, DecodeError> {
        let [x, y, z, uv] = self.view.words::<4>(offset, self.endian)?;
        Ok(Vertex {
            position: [fixed_13_19(x), fixed_13_19(y), fixed_13_19(z)],
            uv,
        })
    }

    fn read_polygon(&mut self) -> Result<Polygon, DecodeError> {
        let words = self.view.words::<HEADER_WORDS>(self.offset, self.endian)?;
        let header = PolygonHeader::from_words(&words);
        log::trace!(
            "polygon at {:?}+{:#X}: {:08X?}",
            self.view.region(),
            self.offset,
            words
        );

        let carried = header.carried().ok_or(DecodeError::MalformedPolygon {
            region: self.view.region(),
            offset: self.offset,
            code: header.reuse_code,
        })?;
        let explicit = header.shape.vertex_count() - carried.len();

        let mut vertices: Vec<Vertex> = carried.iter().map(|&slot| self.slots.get(slot)).collect();
        let first = self.offset + HEADER_BYTES;
        for i in 0..explicit {
            vertices.push(self.read_vertex(first + i * VERTEX_BYTES)?);
        }

        self.slots.save(&vertices);
        self.offset = first + explicit * VERTEX_BYTES;
        Ok(Polygon { header, vertices })
    }
}

impl Iterator for ModelStream<'_> {
    type Item = Result<Polygon, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.decoded == 0 {
            match self.view.word(self.offset, self.endian) {
                Ok(0) => {
                    log::debug!("empty model at {:?}+{:#X}", self.view.region(), self.offset);
                    self.done = true;
                    return None;
                }
                Ok(_) => {}
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
        if self.decoded >= self.max_polygons {
            self.done = true;
            return Some(Err(DecodeError::StreamOverrun {
                what: "model polygon stream",
                limit: self.max_polygons,
            }));
        }

        let polygon = self.read_polygon();
        self.decoded += 1;
        match &polygon {
            Ok(p) if !p.header.last => {}
            _ => self.done = true,
        }
        Some(polygon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::address::Region;

    fn header(code: u32, quad: bool, last: bool) -> [u32; HEADER_WORDS] {
        let mut w = [0u32; HEADER_WORDS];
        w[0] = code | if quad { 0x40 } else { 0 } | 0x100;
        w[1] = if last { 0x04 } else { 0 };
        w[4] = 0x1020_3000;
        w
    }

    fn push(bytes: &mut Vec<u8>, word: u32, endian: Endian) {
        match endian {
            Endian::Little => bytes.extend_from_slice(&word.to_le_bytes()),
            Endian::Big => bytes.extend_from_slice(&word.to_be_bytes()),
        }
    }

    fn record(bytes: &mut Vec<u8>, h: [u32; HEADER_WORDS], xs: &[i32], endian: Endian) {
        for w in h {
            push(bytes, w, endian);
        }
        for &x in xs {
            push(bytes, (x << 19) as u32, endian);
            push(bytes, 0, endian);
            push(bytes, 0, endian);
            push(bytes, 0, endian);
        }
    }

    fn xs(p: &Polygon) -> Vec<f32> {
        p.vertices.iter().map(|v| v.position[0]).collect()
    }

    #[test]
    fn test_empty_model_yields_nothing() {
        let bytes = [0u8; 8];
        let view = RegionView::new(Region::ModelRam, &bytes);
        assert_eq!(ModelStream::new(view, 0, 16).count(), 0);
    }

    #[test]
    fn test_reuse_carries_previous_vertices() {
        let mut bytes = Vec::new();
        let e = Endian::Little;
        record(&mut bytes, header(0, true, false), &[1, 2, 3, 4], e);
        record(&mut bytes, header(0xC, true, false), &[5, 6], e);
        record(&mut bytes, header(0x5, false, true), &[7], e);
        let view = RegionView::new(Region::ModelRam, &bytes);
        let polygons: Vec<_> = ModelStream::new(view, 0, 16)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(polygons.len(), 3);
        assert_eq!(xs(&polygons[0]), vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(xs(&polygons[1]), vec![3.0, 4.0, 5.0, 6.0]);
        assert_eq!(xs(&polygons[2]), vec![3.0, 5.0, 7.0]);
        assert_eq!(polygons[2].header.color, [0x10, 0x20, 0x30]);
    }

    #[test]
    fn test_rom_models_are_big_endian() {
        let mut bytes = Vec::new();
        record(&mut bytes, header(0, false, true), &[-1, 2, 3], Endian::Big);
        let view = RegionView::new(Region::ModelRom, &bytes);
        let stream = ModelStream::new(view, 0, 16);
        assert_eq!(stream.endian(), Endian::Big);
        let polygons: Vec<_> = stream.collect::<Result<_, _>>().unwrap();
        assert_eq!(xs(&polygons[0]), vec![-1.0, 2.0, 3.0]);
        assert_eq!(polygons[0].header.color, [0x10, 0x20, 0x30]);
    }

    #[test]
    fn test_unlisted_reuse_code_ends_model() {
        let mut bytes = Vec::new();
        let e = Endian::Little;
        record(&mut bytes, header(0, false, false), &[1, 2, 3], e);
        record(&mut bytes, header(0x7, false, true), &[], e);
        let view = RegionView::new(Region::ModelRam, &bytes);
        let results: Vec<_> = ModelStream::new(view, 0, 16).collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert_eq!(
            results[1],
            Err(DecodeError::MalformedPolygon {
                region: Region::ModelRam,
                offset: 0x4C,
                code: 0x7
            })
        );
    }

    #[test]
    fn test_missing_last_flag_is_capped() {
        let mut bytes = Vec::new();
        for _ in 0..4 {
            record(&mut bytes, header(0, false, false), &[1, 2, 3], Endian::Little);
        }
        let view = RegionView::new(Region::ModelRam, &bytes);
        let results: Vec<_> = ModelStream::new(view, 0, 2).collect();
        assert_eq!(results.len(), 3);
        assert!(matches!(
            results[2],
            Err(DecodeError::StreamOverrun { limit: 2, .. })
        ));
    }

    #[test]
    fn test_running_off_the_region_is_an_error() {
        let mut bytes = Vec::new();
        record(&mut bytes, header(0, false, false), &[1, 2, 3], Endian::Little);
        let view = RegionView::new(Region::ModelRam, &bytes);
        let results: Vec<_> = ModelStream::new(view, 0, 16).collect();
        assert_eq!(results.len(), 2);
        assert!(matches!(results[1], Err(DecodeError::OutOfBounds { .. })));
    }

    #[test]
    fn test_untextured_polygon_has_no_texture() {
        let mut atlas = Atlas::default();
        atlas.stamp(
            crate::data_structures::atlas::CellRect::from_texels(0, 0, 32, 32),
            crate::render::TextureHandle(1),
        );
        let polygon = Polygon {
            header: PolygonHeader::from_words(&header(0, false, true)),
            vertices: vec![Vertex::default(); 3],
        };
        assert_eq!(polygon.to_primitive(&atlas).texture, None);
        let mut words = header(0, false, true);
        words[6] = 0x0400_0000;
        let textured = Polygon {
            header: PolygonHeader::from_words(&words),
            vertices: vec![Vertex::default(); 3],
        };
        let primitive = textured.to_primitive(&atlas);
        assert_eq!(primitive.texture, Some(crate::render::TextureHandle(1)));
        assert_eq!(primitive.kind, PrimitiveKind::Triangle);
    }
}
