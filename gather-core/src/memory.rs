//! In-memory repository doubles for engine tests. A single mutex makes each
//! conditional write atomic, mirroring the transactional store.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use crate::booking::{Booking, BookingWithRoom};
use crate::enrollment::Enrollment;
use crate::hotel::{Hotel, HotelWithRooms, Room};
use crate::repository::{
    BookingRepository, EnrollmentRepository, HotelRepository, PaymentInsertError, SlotError,
    StoreError, TicketInsertError, TicketRepository,
};
use crate::ticket::{NewPayment, Payment, Ticket, TicketStatus, TicketWithType, TicketType};

#[derive(Default)]
struct State {
    enrollments: Vec<Enrollment>,
    ticket_types: Vec<TicketType>,
    tickets: Vec<Ticket>,
    payments: Vec<Payment>,
    hotels: Vec<Hotel>,
    rooms: Vec<Room>,
    bookings: Vec<Booking>,
}

#[derive(Default)]
pub struct MemStore {
    state: Mutex<State>,
}

impl MemStore {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn add_enrollment(&self, user_id: Uuid) -> Uuid {
        let now = Utc::now();
        let enrollment = Enrollment {
            id: Uuid::new_v4(),
            user_id,
            name: "Attendee".to_string(),
            created_at: now,
            updated_at: now,
        };
        let id = enrollment.id;
        self.lock().enrollments.push(enrollment);
        id
    }

    pub fn add_ticket_type(&self, price: i32, is_remote: bool, includes_hotel: bool) -> Uuid {
        let ticket_type = TicketType {
            id: Uuid::new_v4(),
            name: "Standard".to_string(),
            price,
            is_remote,
            includes_hotel,
        };
        let id = ticket_type.id;
        self.lock().ticket_types.push(ticket_type);
        id
    }

    pub fn add_ticket(&self, enrollment_id: Uuid, ticket_type_id: Uuid, status: TicketStatus) -> Uuid {
        let now = Utc::now();
        let ticket = Ticket {
            id: Uuid::new_v4(),
            enrollment_id,
            ticket_type_id,
            status,
            created_at: now,
            updated_at: now,
        };
        let id = ticket.id;
        self.lock().tickets.push(ticket);
        id
    }

    pub fn add_hotel_with_room(&self, capacity: i32) -> (Uuid, Uuid) {
        let now = Utc::now();
        let hotel = Hotel {
            id: Uuid::new_v4(),
            name: "Hotel Plaza".to_string(),
            image: "https://example.com/plaza.jpg".to_string(),
            created_at: now,
            updated_at: now,
        };
        let room = Room {
            id: Uuid::new_v4(),
            hotel_id: hotel.id,
            name: "101".to_string(),
            capacity,
        };
        let ids = (hotel.id, room.id);
        let mut state = self.lock();
        state.hotels.push(hotel);
        state.rooms.push(room);
        ids
    }

    pub fn bookings_in_room(&self, room_id: Uuid) -> usize {
        self.lock()
            .bookings
            .iter()
            .filter(|b| b.room_id == room_id)
            .count()
    }
}

fn with_type(state: &State, ticket: &Ticket) -> Option<TicketWithType> {
    state
        .ticket_types
        .iter()
        .find(|t| t.id == ticket.ticket_type_id)
        .map(|ticket_type| TicketWithType {
            ticket: ticket.clone(),
            ticket_type: ticket_type.clone(),
        })
}

#[async_trait]
impl EnrollmentRepository for MemStore {
    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<Enrollment>, StoreError> {
        Ok(self
            .lock()
            .enrollments
            .iter()
            .find(|e| e.user_id == user_id)
            .cloned())
    }

    async fn find_by_id(&self, enrollment_id: Uuid) -> Result<Option<Enrollment>, StoreError> {
        Ok(self
            .lock()
            .enrollments
            .iter()
            .find(|e| e.id == enrollment_id)
            .cloned())
    }
}

#[async_trait]
impl TicketRepository for MemStore {
    async fn find_by_enrollment(
        &self,
        enrollment_id: Uuid,
    ) -> Result<Option<TicketWithType>, StoreError> {
        let state = self.lock();
        Ok(state
            .tickets
            .iter()
            .find(|t| t.enrollment_id == enrollment_id)
            .and_then(|t| with_type(&state, t)))
    }

    async fn find_by_id(&self, ticket_id: Uuid) -> Result<Option<TicketWithType>, StoreError> {
        let state = self.lock();
        Ok(state
            .tickets
            .iter()
            .find(|t| t.id == ticket_id)
            .and_then(|t| with_type(&state, t)))
    }

    async fn ticket_type(&self, ticket_type_id: Uuid) -> Result<Option<TicketType>, StoreError> {
        Ok(self
            .lock()
            .ticket_types
            .iter()
            .find(|t| t.id == ticket_type_id)
            .cloned())
    }

    async fn list_ticket_types(&self) -> Result<Vec<TicketType>, StoreError> {
        Ok(self.lock().ticket_types.clone())
    }

    async fn create_reserved(
        &self,
        enrollment_id: Uuid,
        ticket_type_id: Uuid,
    ) -> Result<Ticket, TicketInsertError> {
        let mut state = self.lock();
        if state.tickets.iter().any(|t| t.enrollment_id == enrollment_id) {
            return Err(TicketInsertError::AlreadyExists(enrollment_id));
        }
        let now = Utc::now();
        let ticket = Ticket {
            id: Uuid::new_v4(),
            enrollment_id,
            ticket_type_id,
            status: TicketStatus::Reserved,
            created_at: now,
            updated_at: now,
        };
        state.tickets.push(ticket.clone());
        Ok(ticket)
    }

    async fn record_payment(&self, payment: NewPayment) -> Result<Payment, PaymentInsertError> {
        let mut state = self.lock();
        if state
            .payments
            .iter()
            .any(|p| p.ticket_id == payment.ticket_id)
        {
            return Err(PaymentInsertError::AlreadyRecorded(payment.ticket_id));
        }
        let now = Utc::now();
        let ticket = state
            .tickets
            .iter_mut()
            .find(|t| t.id == payment.ticket_id)
            .ok_or_else(|| StoreError("payment references a missing ticket".to_string()))?;
        ticket.status = TicketStatus::Paid;
        ticket.updated_at = now;

        let row = Payment {
            id: Uuid::new_v4(),
            ticket_id: payment.ticket_id,
            card_issuer: payment.card_issuer,
            card_last_digits: payment.card_last_digits,
            value: payment.value,
            created_at: now,
            updated_at: now,
        };
        state.payments.push(row.clone());
        Ok(row)
    }

    async fn payment_for_ticket(&self, ticket_id: Uuid) -> Result<Option<Payment>, StoreError> {
        Ok(self
            .lock()
            .payments
            .iter()
            .find(|p| p.ticket_id == ticket_id)
            .cloned())
    }
}

#[async_trait]
impl HotelRepository for MemStore {
    async fn list(&self) -> Result<Vec<Hotel>, StoreError> {
        Ok(self.lock().hotels.clone())
    }

    async fn find_with_rooms(&self, hotel_id: Uuid) -> Result<Option<HotelWithRooms>, StoreError> {
        let state = self.lock();
        Ok(state.hotels.iter().find(|h| h.id == hotel_id).map(|hotel| {
            HotelWithRooms {
                hotel: hotel.clone(),
                rooms: state
                    .rooms
                    .iter()
                    .filter(|r| r.hotel_id == hotel_id)
                    .cloned()
                    .collect(),
            }
        }))
    }

    async fn room(&self, room_id: Uuid) -> Result<Option<Room>, StoreError> {
        Ok(self.lock().rooms.iter().find(|r| r.id == room_id).cloned())
    }
}

#[async_trait]
impl BookingRepository for MemStore {
    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<BookingWithRoom>, StoreError> {
        let state = self.lock();
        Ok(state
            .bookings
            .iter()
            .find(|b| b.user_id == user_id)
            .and_then(|booking| {
                state
                    .rooms
                    .iter()
                    .find(|r| r.id == booking.room_id)
                    .map(|room| BookingWithRoom {
                        booking: booking.clone(),
                        room: room.clone(),
                    })
            }))
    }

    async fn insert_if_free_slot(
        &self,
        booking_id: Uuid,
        user_id: Uuid,
        room_id: Uuid,
    ) -> Result<(), SlotError> {
        let mut state = self.lock();
        let capacity = state
            .rooms
            .iter()
            .find(|r| r.id == room_id)
            .map(|r| r.capacity)
            .ok_or(SlotError::RoomMissing(room_id))?;
        // Same order as the transactional store: the capacity verdict comes
        // from the locked count, the duplicate holder only from the unique
        // key at insert.
        let occupied = state.bookings.iter().filter(|b| b.room_id == room_id).count();
        if occupied as i32 >= capacity {
            return Err(SlotError::SlotsExhausted(room_id));
        }
        if state.bookings.iter().any(|b| b.user_id == user_id) {
            return Err(SlotError::DuplicateHolder(user_id));
        }
        let now = Utc::now();
        state.bookings.push(Booking {
            id: booking_id,
            user_id,
            room_id,
            created_at: now,
            updated_at: now,
        });
        Ok(())
    }

    async fn move_if_free_slot(
        &self,
        booking_id: Uuid,
        new_room_id: Uuid,
    ) -> Result<(), SlotError> {
        let mut state = self.lock();
        let capacity = state
            .rooms
            .iter()
            .find(|r| r.id == new_room_id)
            .map(|r| r.capacity)
            .ok_or(SlotError::RoomMissing(new_room_id))?;
        let occupied = state
            .bookings
            .iter()
            .filter(|b| b.room_id == new_room_id && b.id != booking_id)
            .count();
        if occupied as i32 >= capacity {
            return Err(SlotError::SlotsExhausted(new_room_id));
        }
        let booking = state
            .bookings
            .iter_mut()
            .find(|b| b.id == booking_id)
            .ok_or_else(|| SlotError::Store(StoreError("booking disappeared".to_string())))?;
        booking.room_id = new_room_id;
        booking.updated_at = Utc::now();
        Ok(())
    }
}
